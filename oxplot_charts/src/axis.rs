// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-axis persistent state.
//!
//! An [`Axis`] outlives the frame: its range and scale options carry over
//! while the chart exists. The transient per-frame facts (hovered, dragging)
//! live here too, but are rewritten every frame by the interaction pipeline.

use std::cell::Cell;
use std::rc::Rc;

use oxplot_core::{MAX_TIME_S, MIN_TIME_S, Range, constrain_finite};

/// Smallest lower bound a log-scaled axis will accept.
const LOG_RANGE_FLOOR: f64 = 0.001;

/// Host-supplied axis configuration, applied at `begin_chart`.
///
/// Options are sticky: a chart re-applies the host's options only when they
/// differ from what the host passed the previous frame, so runtime mutations
/// (e.g. from a context menu) survive until the host actually changes its
/// mind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisOptions {
    /// Base-10 logarithmic scale. Mutually exclusive with `time_scale`.
    pub log_scale: bool,
    /// Display calendar-time labels. X axes only.
    pub time_scale: bool,
    /// Flip the axis direction on screen.
    pub inverted: bool,
    /// Pin the lower bound against pan/zoom/select/fit.
    pub lock_min: bool,
    /// Pin the upper bound against pan/zoom/select/fit.
    pub lock_max: bool,
    /// Suppress grid lines for this axis.
    pub no_gridlines: bool,
    /// Suppress tick marks for this axis.
    pub no_tick_marks: bool,
    /// Suppress tick labels for this axis.
    pub no_tick_labels: bool,
}

impl AxisOptions {
    /// Enables or disables log scale.
    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    /// Enables or disables calendar-time labels.
    pub fn with_time_scale(mut self, time_scale: bool) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Enables or disables axis inversion.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Locks or unlocks both bounds.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.lock_min = locked;
        self.lock_max = locked;
        self
    }
}

/// One axis of a chart: scale options, the visible range, optional links to
/// externally owned bounds, and the frame-transient hover/drag facts.
#[derive(Clone, Debug, Default)]
pub struct Axis {
    pub(crate) opts: AxisOptions,
    pub(crate) prev_opts: AxisOptions,
    pub(crate) range: Range,
    pub(crate) linked_min: Option<Rc<Cell<f64>>>,
    pub(crate) linked_max: Option<Rc<Cell<f64>>>,
    pub(crate) dragging: bool,
    pub(crate) hovered_ext: bool,
    pub(crate) hovered_tot: bool,
}

impl Axis {
    /// Current options.
    pub fn options(&self) -> AxisOptions {
        self.opts
    }

    /// Currently visible range.
    pub fn range(&self) -> Range {
        self.range
    }

    /// Whether the axis region (excluding the plot area) is hovered.
    pub fn hovered(&self) -> bool {
        self.hovered_ext
    }

    /// Whether this axis is being dragged.
    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// Re-applies host options only when the host changed them, so runtime
    /// flag mutations stick across frames.
    pub(crate) fn apply_options(&mut self, opts: AxisOptions, force: bool) {
        if force || opts != self.prev_opts {
            self.opts = opts;
        }
        self.prev_opts = opts;
    }

    /// Sanitizes a candidate bound for this axis's scale.
    fn constrain_value(&self, v: f64) -> f64 {
        let mut v = constrain_finite(v);
        if self.opts.log_scale && v <= 0.0 {
            v = LOG_RANGE_FLOOR;
        }
        if self.opts.time_scale {
            v = v.clamp(MIN_TIME_S, MAX_TIME_S);
        }
        v
    }

    /// Sets the lower bound if the sanitized value stays below the current
    /// upper bound. Returns whether the bound changed.
    pub(crate) fn set_min(&mut self, v: f64) -> bool {
        let v = self.constrain_value(v);
        if v >= self.range.max {
            return false;
        }
        self.range.min = v;
        true
    }

    /// Sets the upper bound if the sanitized value stays above the current
    /// lower bound. Returns whether the bound changed.
    pub(crate) fn set_max(&mut self, v: f64) -> bool {
        let v = self.constrain_value(v);
        if v <= self.range.min {
            return false;
        }
        self.range.max = v;
        true
    }

    /// Replaces the range wholesale, then re-establishes the invariants.
    pub(crate) fn set_range(&mut self, range: Range) {
        self.range = range;
        self.constrain();
    }

    /// Re-establishes range invariants: finite bounds, positive bounds on log
    /// axes, clamped time bounds, and a strictly positive extent. The
    /// collapsed-range epsilon scales with the bound magnitude so it cannot
    /// round away.
    pub(crate) fn constrain(&mut self) {
        self.range.min = self.constrain_value(self.range.min);
        self.range.max = self.constrain_value(self.range.max);
        if self.range.max <= self.range.min {
            self.range.max = self.range.min + f64::EPSILON * self.range.min.abs().max(1.0);
        }
    }

    /// Copies linked external bounds into the axis (frame start).
    pub(crate) fn pull_linked(&mut self) {
        if let Some(min) = self.linked_min.clone() {
            self.set_min(min.get());
        }
        if let Some(max) = self.linked_max.clone() {
            self.set_max(max.get());
        }
    }

    /// Copies the axis bounds back out to linked storage (frame end).
    pub(crate) fn push_linked(&self) {
        if let Some(min) = &self.linked_min {
            min.set(self.range.min);
        }
        if let Some(max) = &self.linked_max {
            max.set(self.range.max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_min_refuses_to_cross_max() {
        let mut axis = Axis::default();
        axis.set_range(Range::new(0.0, 10.0));
        assert!(!axis.set_min(10.0));
        assert!(!axis.set_min(11.0));
        assert!(axis.set_min(9.0));
        assert_eq!(axis.range().min, 9.0);
    }

    #[test]
    fn log_axis_floors_nonpositive_bounds() {
        let mut axis = Axis {
            opts: AxisOptions::default().with_log_scale(true),
            ..Axis::default()
        };
        axis.set_range(Range::new(-5.0, 100.0));
        assert_eq!(axis.range().min, 0.001);
        assert_eq!(axis.range().max, 100.0);
    }

    #[test]
    fn constrain_repairs_inverted_and_nan_bounds() {
        let mut axis = Axis::default();
        axis.set_range(Range::new(f64::NAN, f64::INFINITY));
        let r = axis.range();
        assert!(r.min.is_finite() && r.max.is_finite());
        assert!(r.max > r.min);

        axis.set_range(Range::new(5.0, 5.0));
        assert!(axis.range().max > axis.range().min);
    }

    #[test]
    fn options_reapply_only_on_host_change() {
        let mut axis = Axis::default();
        let host = AxisOptions::default();
        axis.apply_options(host, true);
        // runtime mutation (e.g. a context menu toggling log scale)
        axis.opts.log_scale = true;
        axis.apply_options(host, false);
        assert!(axis.opts.log_scale, "unchanged host options must not clobber");
        axis.apply_options(host.with_inverted(true), false);
        assert!(!axis.opts.log_scale, "changed host options re-apply");
    }

    #[test]
    fn linked_bounds_round_trip() {
        let min = Rc::new(Cell::new(2.0));
        let max = Rc::new(Cell::new(8.0));
        let mut axis = Axis {
            linked_min: Some(min.clone()),
            linked_max: Some(max.clone()),
            ..Axis::default()
        };
        axis.set_range(Range::new(0.0, 10.0));
        axis.pull_linked();
        assert_eq!((axis.range().min, axis.range().max), (2.0, 8.0));
        axis.range = Range::new(1.0, 9.0);
        axis.push_linked();
        assert_eq!((min.get(), max.get()), (1.0, 9.0));
    }
}
