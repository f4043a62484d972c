// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick generation for linear, logarithmic, and calendar-time axes.
//!
//! All three generators are pure functions of a visible [`Range`], a tick
//! budget (or pixel width), and a [`TextMeasurer`]; they append into a
//! [`TickCollection`], which owns the shared label text buffer and tracks the
//! widest label so the runtime can size axis gutters before the plot
//! rectangle is final.

extern crate alloc;

use alloc::format;
use alloc::string::String;

use smallvec::SmallVec;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::measure::{Size, TextMeasurer};
use crate::range::Range;
use crate::time::{Instant, TimeFmt, TimeUnit};

/// Maximum number of grid steps any generator will emit, as a guard against
/// pathological range/budget combinations.
const MAX_STEPS: usize = 10_000;

/// Maximum allowable density of time-axis labels, in labels per label-width.
const MAX_LABEL_DENSITY: f64 = 0.5;

/// One grid position on an axis, in data space, with its resolved label.
///
/// `level` is only meaningful on time axes: 0 is the fine row of labels, 1
/// the coarse row drawn beneath it.
#[derive(Clone, Copy, Debug)]
pub struct Tick {
    /// Position in data units.
    pub plot_pos: f64,
    /// Position in pixels, filled in once the frame's transform is final.
    pub pixel_pos: f32,
    /// Major ticks get grid lines and stronger styling; minor ticks do not.
    pub major: bool,
    /// Whether the label (if any) should be drawn.
    pub show_label: bool,
    /// Label row for two-level time axes; 0 for all other axes.
    pub level: u8,
    /// Pixel extents of the rendered label, zero when unlabeled.
    pub label_size: Size,
    label_offset: u32,
    label_len: u32,
}

impl Tick {
    fn new(plot_pos: f64, major: bool, show_label: bool) -> Self {
        Self {
            plot_pos,
            pixel_pos: 0.0,
            major,
            show_label,
            level: 0,
            label_size: Size::default(),
            label_offset: 0,
            label_len: 0,
        }
    }

    /// Returns true if a label was rendered into the collection's buffer.
    pub fn has_label(&self) -> bool {
        self.label_len > 0
    }
}

/// An insertion-ordered set of ticks plus their shared label text.
#[derive(Clone, Debug, Default)]
pub struct TickCollection {
    ticks: SmallVec<[Tick; 32]>,
    labels: String,
    max_size: Size,
}

impl TickCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears ticks and label text, keeping allocations for the next frame.
    pub fn reset(&mut self) {
        self.ticks.clear();
        self.labels.clear();
        self.max_size = Size::default();
    }

    /// Number of ticks.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Returns true if no ticks have been generated.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Iterates over the ticks in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Tick> {
        self.ticks.iter()
    }

    /// Returns the label text for a tick, if it has one.
    pub fn label(&self, tick: &Tick) -> Option<&str> {
        if tick.label_len == 0 {
            return None;
        }
        let start = tick.label_offset as usize;
        let end = start + tick.label_len as usize;
        self.labels.get(start..end)
    }

    /// The largest width/height among labels that will be shown, used to
    /// reserve axis gutters.
    pub fn max_label_size(&self) -> Size {
        self.max_size
    }

    /// Recomputes every tick's pixel position through `map`.
    pub fn set_pixel_positions(&mut self, mut map: impl FnMut(f64) -> f64) {
        for tick in &mut self.ticks {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "pixel coordinates fit f32 by construction"
            )]
            {
                tick.pixel_pos = map(tick.plot_pos) as f32;
            }
        }
    }

    fn push(&mut self, tick: Tick) {
        if tick.show_label && tick.label_len > 0 {
            self.max_size.width = self.max_size.width.max(tick.label_size.width);
            self.max_size.height = self.max_size.height.max(tick.label_size.height);
        }
        self.ticks.push(tick);
    }

    /// Appends `text` to the label buffer and returns its span and extents.
    fn append_label(&mut self, text: &str, measurer: &dyn TextMeasurer) -> (u32, u32, Size) {
        let offset = self.labels.len();
        self.labels.push_str(text);
        debug_assert!(
            self.labels.len() <= u32::MAX as usize,
            "label buffer overflow"
        );
        #[allow(
            clippy::cast_possible_truncation,
            reason = "label buffers stay far below 4 GiB"
        )]
        let span = (offset as u32, text.len() as u32);
        (span.0, span.1, measurer.measure(text))
    }

    fn push_labeled(&mut self, mut tick: Tick, text: &str, measurer: &dyn TextMeasurer) {
        let (offset, len, size) = self.append_label(text, measurer);
        tick.label_offset = offset;
        tick.label_len = len;
        tick.label_size = size;
        self.push(tick);
    }

    /// Default linear ticks: "nice" major steps with `n_minor - 1` evenly
    /// spaced subdivisions, all labeled with shortest round-trip decimals.
    pub fn add_linear(
        &mut self,
        range: Range,
        n_major: usize,
        n_minor: usize,
        measurer: &dyn TextMeasurer,
    ) {
        if !range.size().is_finite() {
            return;
        }
        let n_major = n_major.max(2);
        if range.size() <= 2.0 * f64::EPSILON {
            // Degenerate span: one tick is all that fits.
            let tick = Tick::new(range.min, true, true);
            self.push_labeled(tick, &format_value(range.min), measurer);
            return;
        }
        let nice_range = nice_num(range.size() * 0.99, false);
        let interval = nice_num(nice_range / (n_major - 1) as f64, true);
        if !(interval > 0.0) || !interval.is_finite() {
            let tick = Tick::new(range.min, true, true);
            self.push_labeled(tick, &format_value(range.min), measurer);
            return;
        }
        let graph_min = (range.min / interval).floor() * interval;
        let graph_max = (range.max / interval).ceil() * interval;
        let mut major = graph_min;
        let mut steps = 0;
        while major < graph_max + 0.5 * interval && steps < MAX_STEPS {
            if range.contains(major) {
                let tick = Tick::new(major, true, true);
                self.push_labeled(tick, &format_value(major), measurer);
            }
            for i in 1..n_minor {
                let minor = major + i as f64 * interval / n_minor as f64;
                if range.contains(minor) {
                    let tick = Tick::new(minor, false, true);
                    self.push_labeled(tick, &format_value(minor), measurer);
                }
            }
            major += interval;
            steps += 1;
        }
    }

    /// Logarithmic ticks: decade-boundary majors with scientific labels and
    /// unlabeled interior minors. Emits nothing when a bound is non-positive.
    pub fn add_log(&mut self, range: Range, n_major: usize, measurer: &dyn TextMeasurer) {
        if range.min <= 0.0 || range.max <= 0.0 {
            return;
        }
        let n_major = n_major.max(1);
        let log_min = range.min.log10();
        let log_max = range.max.log10();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "decade exponents of finite positive bounds"
        )]
        let (span_exp, mut exp_min, exp_max) =
            ((log_max - log_min) as i32, log_min as i32, log_max as i32);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "tick budgets are small"
        )]
        let mut exp_step = (span_exp / (n_major as i32).max(1)).max(1);
        if exp_step != 1 {
            // Step in multiples of three decades, aligned so a major lands on
            // exponent zero.
            while exp_step % 3 != 0 {
                exp_step += 1;
            }
            while exp_min % exp_step != 0 {
                exp_min -= 1;
            }
        }
        let mut e = exp_min - exp_step;
        while e < exp_max + exp_step {
            let major = 10_f64.powi(e);
            if major >= range.min - f64::EPSILON && major <= range.max + f64::EPSILON {
                let tick = Tick::new(major, true, true);
                self.push_labeled(tick, &format_scientific(major), measurer);
            }
            for j in 0..exp_step {
                let decade_lo = 10_f64.powi(e + j);
                let decade_hi = 10_f64.powi(e + j + 1);
                let interval = (decade_hi - decade_lo) / 9.0;
                // The decade before a skipped one carries an extra minor so
                // the gap does not read as missing data.
                let count = if j < exp_step - 1 { 10 } else { 9 };
                for i in 1..count {
                    let minor = decade_lo + i as f64 * interval;
                    if minor >= range.min - f64::EPSILON && minor <= range.max + f64::EPSILON {
                        self.push(Tick::new(minor, false, false));
                    }
                }
            }
            e += exp_step;
        }
    }

    /// Two-level calendar-time ticks: a fine label row (level 0) stepped from
    /// the per-unit division tables, and a coarse row (level 1) at the
    /// enclosing unit's boundaries. Year-granularity axes use the plain
    /// nice-number algorithm over calendar years.
    pub fn add_time(&mut self, range: Range, plot_width: f64, measurer: &dyn TextMeasurer) {
        let unit0 = TimeUnit::for_span(range.size() / (plot_width / 100.0));
        let unit1 = unit0.coarser();
        let fmt0 = TimeFmt::level0(unit0);
        let fmt1 = TimeFmt::level1(unit1);
        let fmt_first = TimeFmt::level1_first(unit1);
        let t_min = Instant::from_f64(range.min);
        let t_max = Instant::from_f64(range.max);

        if unit0 == TimeUnit::Year {
            self.add_time_years(range, t_min, t_max, plot_width, measurer);
            return;
        }

        let pix_per_major_div = plot_width / (range.size() / unit1.span_seconds());
        let fmt0_width = measurer.measure(fmt0.widest_template()).width;
        let fmt1_width = measurer.measure(fmt1.widest_template()).width;
        let fmt_first_width = measurer.measure(fmt_first.widest_template()).width;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "label counts are small; infinities saturate"
        )]
        let minor_per_major = (MAX_LABEL_DENSITY * pix_per_major_div / fmt0_width) as i32;
        let step = unit0.step_for_divs(minor_per_major);

        // Span (offset, len) of the last coarse label emitted, for the
        // repeated-label suppression below.
        let mut last_major: Option<(u32, u32)> = None;

        let mut t1 = t_min.floor(unit1);
        let mut guard = 0;
        while t1 < t_max && guard < MAX_STEPS {
            guard += 1;
            let t2 = t1.add(unit1, 1);
            if t2 <= t1 {
                break;
            }
            if t1 >= t_min && t1 <= t_max {
                // Fine tick on the boundary.
                let mut fine = Tick::new(t1.to_f64(), true, true);
                fine.level = 0;
                self.push_labeled(fine, &t1.format(fmt0), measurer);
                // Coarse tick beneath it. The label is always rendered into
                // the buffer so the next boundary can compare against it;
                // only the show flag is dropped on a repeat.
                let text = t1.format(if last_major.is_none() { fmt_first } else { fmt1 });
                let (offset, len, size) = self.append_label(&text, measurer);
                let mut coarse = Tick::new(t1.to_f64(), true, true);
                coarse.level = 1;
                coarse.label_offset = offset;
                coarse.label_len = len;
                coarse.label_size = size;
                if let Some(prev) = last_major {
                    if self.label_suffix_eq(prev, (offset, len)) {
                        coarse.show_label = false;
                    }
                }
                last_major = Some((offset, len));
                self.push(coarse);
            }
            // Fine ticks between this boundary and the next.
            if minor_per_major > 1 && t_min <= t2 && t1 <= t_max && step > 0 {
                let mut t12 = t1.add(unit0, step);
                let mut inner_guard = 0;
                while t12 < t2 && inner_guard < MAX_STEPS {
                    inner_guard += 1;
                    let px_to_t2 = (t2.to_f64() - t12.to_f64()) / range.size() * plot_width;
                    if t12 >= t_min && t12 <= t_max {
                        let mut fine = Tick::new(t12.to_f64(), false, px_to_t2 >= fmt0_width);
                        fine.level = 0;
                        self.push_labeled(fine, &t12.format(fmt0), measurer);
                        // A view that starts mid-division has no coarse label
                        // yet; attach the verbose one to the first fine tick
                        // with room for it.
                        if last_major.is_none()
                            && px_to_t2 >= fmt0_width
                            && px_to_t2 >= (fmt1_width + fmt_first_width) / 2.0
                        {
                            let text = t12.format(fmt_first);
                            let (offset, len, size) = self.append_label(&text, measurer);
                            let mut coarse = Tick::new(t12.to_f64(), true, true);
                            coarse.level = 1;
                            coarse.label_offset = offset;
                            coarse.label_len = len;
                            coarse.label_size = size;
                            last_major = Some((offset, len));
                            self.push(coarse);
                        }
                    }
                    let next = t12.add(unit0, step);
                    if next <= t12 {
                        break;
                    }
                    t12 = next;
                }
            }
            t1 = t2;
        }
    }

    fn add_time_years(
        &mut self,
        range: Range,
        t_min: Instant,
        t_max: Instant,
        plot_width: f64,
        measurer: &dyn TextMeasurer,
    ) {
        let label_width = measurer.measure(TimeFmt::Yr.widest_template()).width;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "label counts are small; infinities saturate"
        )]
        let max_labels = (MAX_LABEL_DENSITY * plot_width / label_width) as i32;
        let year_min = t_min.year();
        let year_max = t_max.ceil(TimeUnit::Year).year();
        let nice_range = nice_num(f64::from(year_max - year_min) * 0.99, false);
        let mut interval = nice_num(nice_range / f64::from((max_labels - 1).max(1)), true);
        if !(interval > 0.0) || !interval.is_finite() {
            interval = 1.0;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "calendar years fit i32 by construction"
        )]
        let (graph_min, graph_max, step) = (
            ((f64::from(year_min) / interval).floor() * interval) as i32,
            ((f64::from(year_max) / interval).ceil() * interval) as i32,
            (interval as i32).max(1),
        );
        let mut year = graph_min;
        while year < graph_max {
            let t = Instant::from_year(year);
            if t >= t_min && t <= t_max {
                let mut tick = Tick::new(t.to_f64(), true, true);
                tick.level = 0;
                self.push_labeled(tick, &t.format(TimeFmt::Yr), measurer);
            }
            year += step;
        }
    }

    /// Caller-provided tick positions, with optional caller labels. Labels
    /// are truncated at an embedded NUL; missing labels fall back to the
    /// default decimal format.
    pub fn add_custom(
        &mut self,
        positions: &[f64],
        labels: Option<&[&str]>,
        measurer: &dyn TextMeasurer,
    ) {
        for (i, &pos) in positions.iter().enumerate() {
            let tick = Tick::new(pos, false, true);
            match labels.and_then(|l| l.get(i)) {
                Some(text) => {
                    let text = text.split('\0').next().unwrap_or("");
                    self.push_labeled(tick, text, measurer);
                }
                None => self.push_labeled(tick, &format_value(pos), measurer),
            }
        }
    }

    /// Compares two label spans by their common suffix. Calendar labels
    /// repeat by rendering identically (e.g. "Jan" and "Jan"), which is a
    /// property of the text, not of the underlying instants.
    fn label_suffix_eq(&self, a: (u32, u32), b: (u32, u32)) -> bool {
        let text = self.labels.as_bytes();
        let a = &text[a.0 as usize..(a.0 + a.1) as usize];
        let b = &text[b.0 as usize..(b.0 + b.1) as usize];
        let n = a.len().min(b.len());
        a[a.len() - n..] == b[b.len() - n..]
    }
}

impl<'a> IntoIterator for &'a TickCollection {
    type Item = &'a Tick;
    type IntoIter = core::slice::Iter<'a, Tick>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Rounds `x` to a "nice" number: the mantissa snapped to 1, 2, 5, or 10.
///
/// With `round` the nearest candidate is chosen; without it, the smallest
/// candidate not below the mantissa (so the result covers `x`).
pub fn nice_num(x: f64, round: bool) -> f64 {
    if !(x > 0.0) || !x.is_finite() {
        return 0.0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "exponent of a finite positive f64"
    )]
    let exp = x.log10().floor() as i32;
    let f = x / 10_f64.powi(exp);
    let nf = if round {
        if f < 1.5 {
            1.0
        } else if f < 3.0 {
            2.0
        } else if f < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if f <= 1.0 {
        1.0
    } else if f <= 2.0 {
        2.0
    } else if f <= 5.0 {
        5.0
    } else {
        10.0
    };
    nf * 10_f64.powi(exp)
}

/// Formats a value as the shortest decimal that round-trips its first ten
/// significant digits (the default tick label format).
pub fn format_value(v: f64) -> String {
    format!("{}", round_significant(v, 10))
}

/// Formats a value in scientific notation with a bare mantissa (the log-axis
/// tick label format).
pub fn format_scientific(v: f64) -> String {
    format!("{v:.0E}")
}

fn round_significant(v: f64, digits: i32) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "exponent of a finite nonzero f64"
    )]
    let mag = v.abs().log10().floor() as i32;
    let factor = 10_f64.powi(digits - 1 - mag);
    if !factor.is_finite() || factor == 0.0 {
        return v;
    }
    (v * factor).round() / factor
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::measure::HeuristicTextMeasurer;

    fn majors(ticks: &TickCollection) -> Vec<f64> {
        ticks
            .iter()
            .filter(|t| t.major)
            .map(|t| t.plot_pos)
            .collect()
    }

    #[test]
    fn nice_num_snaps_mantissas() {
        assert_eq!(nice_num(9.0, false), 10.0);
        assert_eq!(nice_num(4.2, false), 5.0);
        assert_eq!(nice_num(1.7, false), 2.0);
        assert_eq!(nice_num(0.7, false), 1.0);
        assert_eq!(nice_num(2.4, true), 2.0);
        assert_eq!(nice_num(6.0, true), 5.0);
        assert_eq!(nice_num(8.0, true), 10.0);
        assert_eq!(nice_num(0.0, true), 0.0);
    }

    #[test]
    fn linear_majors_are_monotonic_in_range_and_evenly_stepped() {
        let measurer = HeuristicTextMeasurer::default();
        for &(a, b) in &[(0.0, 10.0), (0.3, 7.7), (-5.1, 3.2), (1e-6, 5e-6)] {
            let mut ticks = TickCollection::new();
            ticks.add_linear(Range::new(a, b), 5, 10, &measurer);
            let majors = majors(&ticks);
            assert!(majors.len() >= 2, "too few majors for [{a}, {b}]");
            let step = majors[1] - majors[0];
            for w in majors.windows(2) {
                assert!(w[1] > w[0], "majors not increasing for [{a}, {b}]");
                assert!(
                    ((w[1] - w[0]) - step).abs() <= 1e-9 * step.abs(),
                    "uneven major step for [{a}, {b}]"
                );
            }
            for t in &ticks {
                assert!(
                    t.plot_pos >= a - 1e-12 && t.plot_pos <= b + 1e-12,
                    "tick outside [{a}, {b}]"
                );
            }
        }
    }

    #[test]
    fn linear_labels_are_short_decimals() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_linear(Range::new(0.0, 1.0), 5, 2, &measurer);
        let labels: Vec<&str> = ticks.iter().filter_map(|t| ticks.label(t)).collect();
        // accumulated 0.1 + 0.2 style noise must not leak into labels
        assert!(
            labels.iter().all(|l| l.len() <= 5),
            "noisy label in {labels:?}"
        );
        assert!(labels.contains(&"0.2"), "missing 0.2 in {labels:?}");
    }

    #[test]
    fn linear_degenerate_range_yields_single_tick() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_linear(Range::new(3.0, 3.0), 5, 10, &measurer);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks.iter().next().unwrap().plot_pos, 3.0);
    }

    #[test]
    fn linear_budget_below_two_is_clamped() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_linear(Range::new(0.0, 1.0), 0, 0, &measurer);
        assert!(!ticks.is_empty());
    }

    #[test]
    fn log_decades_on_1_1000() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_log(Range::new(1.0, 1000.0), 3, &measurer);
        assert_eq!(majors(&ticks), std::vec![1.0, 10.0, 100.0, 1000.0]);
        for &(lo, hi) in &[(1.0, 10.0), (10.0, 100.0), (100.0, 1000.0)] {
            let interior = ticks
                .iter()
                .filter(|t| !t.major && t.plot_pos > lo && t.plot_pos < hi)
                .count();
            assert_eq!(interior, 8, "minors in ({lo}, {hi})");
        }
        // minors carry no labels on log axes
        assert!(ticks.iter().filter(|t| !t.major).all(|t| !t.has_label()));
    }

    #[test]
    fn log_labels_are_scientific() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_log(Range::new(1.0, 1000.0), 3, &measurer);
        let first = ticks.iter().find(|t| t.major).unwrap();
        assert_eq!(ticks.label(first), Some("1E0"));
    }

    #[test]
    fn log_rejects_nonpositive_bounds() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_log(Range::new(0.0, 100.0), 3, &measurer);
        assert!(ticks.is_empty());
        ticks.add_log(Range::new(-1.0, 100.0), 3, &measurer);
        assert!(ticks.is_empty());
    }

    #[test]
    fn time_hour_span_emits_two_level_ticks() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        // six hours starting at the epoch
        ticks.add_time(Range::new(0.0, 6.0 * 3600.0), 600.0, &measurer);
        let coarse: Vec<&Tick> = ticks.iter().filter(|t| t.level == 1).collect();
        assert!(!coarse.is_empty());
        for t in &coarse {
            assert_eq!(t.plot_pos % 3600.0, 0.0, "coarse tick off hour boundary");
        }
        // the first coarse label in view is the verbose date-bearing variant
        let first = coarse.iter().find(|t| t.show_label).unwrap();
        assert!(
            ticks.label(first).unwrap().contains("1/1/70"),
            "first coarse label lacks date context: {:?}",
            ticks.label(first)
        );
    }

    #[test]
    fn time_repeated_coarse_labels_are_suppressed() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        // five milliseconds: coarse boundaries every ms all render the same
        // second-resolution label
        ticks.add_time(Range::new(0.0, 0.005), 500.0, &measurer);
        let shown = ticks
            .iter()
            .filter(|t| t.level == 1 && t.show_label)
            .count();
        let total = ticks.iter().filter(|t| t.level == 1).count();
        assert!(total >= 3, "expected several coarse boundaries, got {total}");
        assert_eq!(shown, 1, "repeated coarse labels must be suppressed");
    }

    #[test]
    fn time_year_spans_use_nice_years() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        let t0 = Instant::from_year(1970).to_f64();
        let t1 = Instant::from_year(2170).to_f64();
        ticks.add_time(Range::new(t0, t1), 600.0, &measurer);
        assert!(!ticks.is_empty());
        let years: Vec<i32> = ticks
            .iter()
            .map(|t| Instant::from_f64(t.plot_pos).year())
            .collect();
        for w in years.windows(2) {
            assert_eq!(w[1] - w[0], years[1] - years[0], "uneven year step");
        }
        for t in &ticks {
            let label = ticks.label(t).unwrap();
            assert_eq!(label.len(), 4, "year label should be bare year: {label}");
        }
    }

    #[test]
    fn custom_labels_truncate_at_nul() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_custom(&[1.0, 2.0], Some(&["ok", "bad\0tail"]), &measurer);
        let labels: Vec<&str> = ticks.iter().filter_map(|t| ticks.label(t)).collect();
        assert_eq!(labels, std::vec!["ok", "bad"]);
    }

    #[test]
    fn max_label_size_tracks_shown_labels_only() {
        let measurer = HeuristicTextMeasurer::default();
        let mut ticks = TickCollection::new();
        ticks.add_log(Range::new(1.0, 100.0), 2, &measurer);
        let widest = ticks
            .iter()
            .filter(|t| t.show_label)
            .map(|t| t.label_size.width)
            .fold(0.0, f64::max);
        assert_eq!(ticks.max_label_size().width, widest);
    }
}
