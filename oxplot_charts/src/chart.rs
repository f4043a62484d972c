// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistent per-chart state.
//!
//! A [`Chart`] is created the first time a name is referenced and lives until
//! the owning context is dropped or its cache is busted. Everything the
//! interaction state machine needs to survive from one frame to the next is
//! here: axes, the selection/query gesture state, and the frame's layout
//! rectangles.

use kurbo::{Point, Rect};

use crate::axis::Axis;

/// Host-supplied chart configuration, applied at `begin_chart` with the same
/// stickiness rule as [`crate::AxisOptions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartOptions {
    /// Enable the second Y axis.
    pub y_axis_2: bool,
    /// Enable the third Y axis.
    pub y_axis_3: bool,
    /// Allow box selection to set axis ranges.
    pub box_select: bool,
    /// Allow the retained query rectangle gesture.
    pub query: bool,
    /// Allow context-menu requests.
    pub menus: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            y_axis_2: false,
            y_axis_3: false,
            box_select: true,
            query: false,
            menus: true,
        }
    }
}

impl ChartOptions {
    /// Enables or disables the query gesture.
    pub fn with_query(mut self, query: bool) -> Self {
        self.query = query;
        self
    }

    /// Enables or disables box selection.
    pub fn with_box_select(mut self, box_select: bool) -> Self {
        self.box_select = box_select;
        self
    }

    /// Enables or disables the extra Y axes.
    pub fn with_extra_y_axes(mut self, y_axis_2: bool, y_axis_3: bool) -> Self {
        self.y_axis_2 = y_axis_2;
        self.y_axis_3 = y_axis_3;
        self
    }
}

/// Identity of a chart: a stable hash of its display name within the host
/// window scope. Re-using a name retrieves the same persistent state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChartId(pub(crate) u64);

/// One interactive plot area: an X axis, up to three Y axes, and the gesture
/// state that persists across frames.
#[derive(Clone, Debug)]
pub struct Chart {
    pub(crate) opts: ChartOptions,
    pub(crate) prev_opts: ChartOptions,
    pub(crate) x_axis: Axis,
    pub(crate) y_axis: [Axis; 3],
    pub(crate) current_y: usize,
    pub(crate) frame_rect: Rect,
    pub(crate) canvas_rect: Rect,
    pub(crate) plot_rect: Rect,
    pub(crate) select_start: Point,
    pub(crate) selecting: bool,
    pub(crate) query_start: Point,
    pub(crate) querying: bool,
    pub(crate) queried: bool,
    pub(crate) dragging_query: bool,
    /// Query rectangle in pixels, relative to the plot rectangle origin so it
    /// tracks the plot across relayouts.
    pub(crate) query_rect: Rect,
    pub(crate) drag_started_frame: u64,
    pub(crate) drag_press: Point,
    pub(crate) drag_max_dist_sq: f64,
}

impl Chart {
    pub(crate) fn new() -> Self {
        Self {
            opts: ChartOptions::default(),
            prev_opts: ChartOptions::default(),
            x_axis: Axis::default(),
            y_axis: [Axis::default(), Axis::default(), Axis::default()],
            current_y: 0,
            frame_rect: Rect::ZERO,
            canvas_rect: Rect::ZERO,
            plot_rect: Rect::ZERO,
            select_start: Point::ZERO,
            selecting: false,
            query_start: Point::ZERO,
            querying: false,
            queried: false,
            dragging_query: false,
            query_rect: Rect::ZERO,
            drag_started_frame: 0,
            drag_press: Point::ZERO,
            drag_max_dist_sq: 0.0,
        }
    }

    pub(crate) fn apply_options(&mut self, opts: ChartOptions, force: bool) {
        if force || opts != self.prev_opts {
            self.opts = opts;
        }
        self.prev_opts = opts;
    }

    /// Current options.
    pub fn options(&self) -> ChartOptions {
        self.opts
    }

    /// The X axis.
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    /// One of the three Y axes. Out-of-range indices are clamped.
    pub fn y_axis(&self, y_axis: usize) -> &Axis {
        debug_assert!(y_axis < 3, "y axis index out of range");
        &self.y_axis[y_axis.min(2)]
    }

    /// The plot-area rectangle computed for the most recent frame.
    pub fn plot_rect(&self) -> Rect {
        self.plot_rect
    }

    /// Whether a query rectangle is currently retained.
    pub fn queried(&self) -> bool {
        self.queried
    }

    /// Whether any axis of this chart is being dragged.
    pub fn dragging(&self) -> bool {
        self.x_axis.dragging || self.y_axis.iter().any(|a| a.dragging)
    }

    /// Squared pixel distance covered by the active (or last) drag, for
    /// click-versus-drag decisions in the host.
    pub fn drag_distance_sq(&self) -> f64 {
        self.drag_max_dist_sq
    }

    /// The retained query rectangle in absolute pixels, if one exists.
    pub fn query_pixel_rect(&self) -> Option<Rect> {
        self.queried.then(|| self.query_rect + self.plot_rect.origin().to_vec2())
    }
}
