// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The explicitly passed plot context: chart registry, per-frame scratch, and
//! the frame pipeline.
//!
//! Each frame a chart goes through a fixed sequence inside
//! [`PlotContext::begin_chart`]: pull linked/preset ranges, constrain, run a
//! tentative tick pass to size the axis gutters, resolve the plot rectangle
//! and hover state, run the interaction stages in priority order (query drag,
//! pan, zoom, box select, query, fit request), then finalize the transform
//! cache and generate ticks for the now-current ranges. Fit application is
//! deferred to [`PlotContext::end_chart`] so it sees the extents accumulated
//! by everything the renderer plotted in between.
//!
//! There is no hidden global: callers own the context and pass it into every
//! operation. The registry is unsynchronized shared mutable state; if multiple
//! render threads exist, synchronization is the caller's responsibility.

use std::cell::Cell;
use std::hash::BuildHasher;
use std::mem;
use std::rc::Rc;

use hashbrown::{DefaultHashBuilder, HashMap};
use kurbo::{Point, Rect};
use tracing::{debug, trace};

use oxplot_core::{
    Instant, Range, TextMeasurer, TickCollection, TimeFmt, TimeUnit, format_scientific,
};

use crate::axis::{Axis, AxisOptions};
use crate::chart::{Chart, ChartId, ChartOptions};
use crate::input::{InputMap, InputState};
use crate::transform::{AxisScale, PlotPoint, TransformCache};

/// Number of Y axes a chart can have.
pub const Y_AXIS_COUNT: usize = 3;

/// Padding between the frame edge and the canvas.
const PLOT_PADDING: f64 = 8.0;
/// Padding between labels and the things they label.
const LABEL_PADDING: f64 = 5.0;
/// Length of minor tick marks, reserved between stacked Y axis gutters.
const MINOR_TICK_LEN: f64 = 5.0;
/// Minor subdivisions per major division on linear axes.
const SUB_DIVS: usize = 10;
/// Base zoom rate per wheel detent.
const ZOOM_RATE: f64 = 0.1;
/// Minimum box-select extent, per dimension, in pixels.
const MIN_SELECT_PX: f64 = 2.0;
/// Minimum retained query extent, per dimension, in pixels.
const MIN_QUERY_PX: f64 = 2.0;

/// When a pre-set range directive applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    /// Apply only when the chart is first created.
    Once,
    /// Apply every frame, which also locks the axis against user changes.
    Always,
}

/// What a context-menu request points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextMenuTarget {
    /// The plot area.
    Plot,
    /// The X axis region.
    XAxis,
    /// A Y axis region.
    YAxis(usize),
}

/// A linked bound: externally owned storage the axis mirrors each frame.
pub type LinkedBound = Rc<Cell<f64>>;

#[derive(Clone, Debug, Default)]
struct CustomTicks {
    positions: Vec<f64>,
    labels: Option<Vec<String>>,
    keep_default: bool,
}

/// Directives that apply to the next `begin_chart` only.
#[derive(Clone, Debug, Default)]
struct NextChartData {
    x_range: Option<(Range, Cond)>,
    y_range: [Option<(Range, Cond)>; Y_AXIS_COUNT],
    linked_x: (Option<LinkedBound>, Option<LinkedBound>),
    linked_y: [(Option<LinkedBound>, Option<LinkedBound>); Y_AXIS_COUNT],
    fit_x: bool,
    fit_y: [bool; Y_AXIS_COUNT],
    custom_x: Option<CustomTicks>,
    custom_y: [Option<CustomTicks>; Y_AXIS_COUNT],
}

/// Facts about one axis that hold for the duration of a frame.
#[derive(Clone, Copy, Debug, Default)]
struct AxisFrameState {
    present: bool,
    lock_min: bool,
    lock_max: bool,
    lock: bool,
    invert: bool,
    has_labels: bool,
}

impl AxisFrameState {
    fn derive(axis: &Axis, present: bool, range_always: bool) -> Self {
        let lock_min = axis.opts.lock_min || range_always;
        let lock_max = axis.opts.lock_max || range_always;
        Self {
            present,
            lock_min,
            lock_max,
            lock: present && lock_min && lock_max,
            invert: axis.opts.inverted,
            has_labels: !axis.opts.no_tick_labels,
        }
    }
}

/// Scratch state valid between `begin_chart` and `end_chart`, reset at both.
#[derive(Debug, Default)]
struct FrameState {
    input: InputState,
    x_ticks: TickCollection,
    y_ticks: [TickCollection; Y_AXIS_COUNT],
    x_state: AxisFrameState,
    y_state: [AxisFrameState; Y_AXIS_COUNT],
    scales: [AxisScale; Y_AXIS_COUNT],
    transforms: TransformCache,
    extents_x: Range,
    extents_y: [Range; Y_AXIS_COUNT],
    fit_this_frame: bool,
    fit_x: bool,
    fit_y: [bool; Y_AXIS_COUNT],
    visible_items: usize,
    hov_frame: bool,
    hov_plot: bool,
    hov_query: bool,
    render_x: bool,
    render_y: [bool; Y_AXIS_COUNT],
    pointer_plot: [PlotPoint; Y_AXIS_COUNT],
    custom_x: Option<CustomTicks>,
    custom_y: [Option<CustomTicks>; Y_AXIS_COUNT],
}

impl FrameState {
    fn reset(&mut self) {
        self.x_ticks.reset();
        for t in &mut self.y_ticks {
            t.reset();
        }
        self.x_state = AxisFrameState::default();
        self.y_state = [AxisFrameState::default(); Y_AXIS_COUNT];
        self.scales = [AxisScale::LinLin; Y_AXIS_COUNT];
        self.extents_x = EMPTY_EXTENT;
        self.extents_y = [EMPTY_EXTENT; Y_AXIS_COUNT];
        self.fit_this_frame = false;
        self.fit_x = false;
        self.fit_y = [false; Y_AXIS_COUNT];
        self.visible_items = 0;
        self.hov_frame = false;
        self.hov_plot = false;
        self.hov_query = false;
        self.render_x = false;
        self.render_y = [false; Y_AXIS_COUNT];
        self.pointer_plot = [PlotPoint::default(); Y_AXIS_COUNT];
        self.custom_x = None;
        self.custom_y = [None, None, None];
    }
}

/// An extent accumulator that nothing has contributed to yet.
const EMPTY_EXTENT: Range = Range {
    min: f64::INFINITY,
    max: f64::NEG_INFINITY,
};

/// Owns every chart keyed by name hash, the gesture map, and the per-frame
/// scratch. Single-threaded by construction (linked bounds are `Rc` handles).
#[derive(Debug, Default)]
pub struct PlotContext {
    charts: HashMap<ChartId, Chart>,
    hash_builder: DefaultHashBuilder,
    input_map: InputMap,
    scope: u64,
    next: NextChartData,
    current: Option<ChartId>,
    frame: FrameState,
}

impl PlotContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host-window scope that chart names are hashed within, so the
    /// same title in two windows stays two charts.
    pub fn set_scope(&mut self, scope: u64) {
        self.scope = scope;
    }

    /// The gesture map.
    pub fn input_map(&self) -> &InputMap {
        &self.input_map
    }

    /// Mutable access to the gesture map.
    pub fn input_map_mut(&mut self) -> &mut InputMap {
        &mut self.input_map
    }

    /// Drops every chart's persistent state.
    pub fn bust_chart_cache(&mut self) {
        debug_assert!(self.current.is_none(), "cannot bust cache mid-frame");
        self.charts.clear();
    }

    /// Read-only view of a chart's persistent state, if it exists.
    pub fn chart_state(&self, title: &str) -> Option<&Chart> {
        self.charts.get(&self.chart_id(title))
    }

    fn chart_id(&self, title: &str) -> ChartId {
        ChartId(self.hash_builder.hash_one((self.scope, title)))
    }

    // --- pre-frame configuration -----------------------------------------

    /// Pre-sets the X range for the next chart. With [`Cond::Always`] the
    /// range re-applies every frame and the axis is locked against gestures.
    pub fn set_next_range_x(&mut self, range: Range, cond: Cond) {
        debug_assert!(
            self.current.is_none(),
            "set_next_range_x must be called before begin_chart"
        );
        self.next.x_range = Some((range, cond));
    }

    /// Pre-sets one Y range for the next chart.
    pub fn set_next_range_y(&mut self, y_axis: usize, range: Range, cond: Cond) {
        debug_assert!(
            self.current.is_none(),
            "set_next_range_y must be called before begin_chart"
        );
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        self.next.y_range[y_axis.min(Y_AXIS_COUNT - 1)] = Some((range, cond));
    }

    /// Links the next chart's X bounds to externally owned storage. Values
    /// are pulled in at frame start and pushed back at frame end; the engine
    /// never owns the storage.
    pub fn link_next_range_x(&mut self, min: Option<LinkedBound>, max: Option<LinkedBound>) {
        debug_assert!(
            self.current.is_none(),
            "link_next_range_x must be called before begin_chart"
        );
        self.next.linked_x = (min, max);
    }

    /// Links one of the next chart's Y axes to externally owned storage.
    pub fn link_next_range_y(
        &mut self,
        y_axis: usize,
        min: Option<LinkedBound>,
        max: Option<LinkedBound>,
    ) {
        debug_assert!(
            self.current.is_none(),
            "link_next_range_y must be called before begin_chart"
        );
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        self.next.linked_y[y_axis.min(Y_AXIS_COUNT - 1)] = (min, max);
    }

    /// Requests a fit of the chosen axes on the next chart's frame.
    pub fn fit_next_axes(&mut self, x: bool, y: [bool; Y_AXIS_COUNT]) {
        debug_assert!(
            self.current.is_none(),
            "fit_next_axes must be called before begin_chart"
        );
        self.next.fit_x = x;
        self.next.fit_y = y;
    }

    /// Supplies caller-provided X ticks for the next chart. `keep_default`
    /// keeps the generated ticks alongside them.
    pub fn set_next_ticks_x(
        &mut self,
        positions: &[f64],
        labels: Option<&[&str]>,
        keep_default: bool,
    ) {
        debug_assert!(
            self.current.is_none(),
            "set_next_ticks_x must be called before begin_chart"
        );
        self.next.custom_x = Some(CustomTicks {
            positions: positions.to_vec(),
            labels: labels.map(|l| l.iter().map(|s| String::from(*s)).collect()),
            keep_default,
        });
    }

    /// Supplies caller-provided ticks for one Y axis of the next chart.
    pub fn set_next_ticks_y(
        &mut self,
        y_axis: usize,
        positions: &[f64],
        labels: Option<&[&str]>,
        keep_default: bool,
    ) {
        debug_assert!(
            self.current.is_none(),
            "set_next_ticks_y must be called before begin_chart"
        );
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        self.next.custom_y[y_axis.min(Y_AXIS_COUNT - 1)] = Some(CustomTicks {
            positions: positions.to_vec(),
            labels: labels.map(|l| l.iter().map(|s| String::from(*s)).collect()),
            keep_default,
        });
    }

    // --- frame lifecycle ---------------------------------------------------

    /// Starts a chart frame. Returns false (and consumes the pending
    /// directives) if the frame rectangle is degenerate.
    ///
    /// Must be paired with [`PlotContext::end_chart`]; nesting charts is a
    /// usage-contract violation.
    pub fn begin_chart(
        &mut self,
        title: &str,
        frame_rect: Rect,
        opts: ChartOptions,
        x_opts: AxisOptions,
        y_opts: [AxisOptions; Y_AXIS_COUNT],
        input: &InputState,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        debug_assert!(
            self.current.is_none(),
            "mismatched begin_chart/end_chart: begin_chart while a chart is open"
        );
        debug_assert!(
            !(x_opts.log_scale && x_opts.time_scale),
            "log_scale and time_scale cannot be enabled together"
        );
        debug_assert!(
            y_opts.iter().all(|o| !o.time_scale),
            "y axes cannot display time-formatted labels"
        );

        self.frame.reset();
        self.frame.input = *input;
        let next = mem::take(&mut self.next);

        if !(frame_rect.width() > 0.0) || !(frame_rect.height() > 0.0) {
            return false;
        }

        let id = self.chart_id(title);
        let just_created = !self.charts.contains_key(&id);
        if just_created {
            debug!(chart = title, "creating chart state");
        }
        let chart = self.charts.entry(id).or_insert_with(Chart::new);
        chart.current_y = 0;

        // Options re-apply only when the host changes them.
        chart.apply_options(opts, just_created);
        chart.x_axis.apply_options(x_opts, just_created);
        for i in 0..Y_AXIS_COUNT {
            chart.y_axis[i].apply_options(y_opts[i], just_created);
        }

        // Linked ranges are pulled before preset ranges so an explicit
        // directive wins over mirrored storage this frame.
        chart.x_axis.linked_min = next.linked_x.0.clone();
        chart.x_axis.linked_max = next.linked_x.1.clone();
        chart.x_axis.pull_linked();
        for i in 0..Y_AXIS_COUNT {
            chart.y_axis[i].linked_min = next.linked_y[i].0.clone();
            chart.y_axis[i].linked_max = next.linked_y[i].1.clone();
            chart.y_axis[i].pull_linked();
        }

        if let Some((range, cond)) = next.x_range {
            if just_created || cond == Cond::Always {
                chart.x_axis.set_range(range);
            }
        }
        for i in 0..Y_AXIS_COUNT {
            if let Some((range, cond)) = next.y_range[i] {
                if just_created || cond == Cond::Always {
                    chart.y_axis[i].set_range(range);
                }
            }
        }

        // Per-frame axis facts and the resolved scale pairings.
        let present = [true, chart.opts.y_axis_2, chart.opts.y_axis_3];
        let x_always = matches!(next.x_range, Some((_, Cond::Always)));
        self.frame.x_state = AxisFrameState::derive(&chart.x_axis, true, x_always);
        for i in 0..Y_AXIS_COUNT {
            let always = matches!(next.y_range[i], Some((_, Cond::Always)));
            self.frame.y_state[i] = AxisFrameState::derive(&chart.y_axis[i], present[i], always);
            self.frame.scales[i] = AxisScale::of(
                chart.x_axis.opts.log_scale,
                chart.y_axis[i].opts.log_scale,
            );
        }

        chart.x_axis.constrain();
        for axis in &mut chart.y_axis {
            axis.constrain();
        }

        // Layout: canvas, then a tentative Y tick pass to size the gutters,
        // then the plot rectangle.
        chart.frame_rect = frame_rect;
        chart.canvas_rect = frame_rect.inset(-PLOT_PADDING);
        let canvas = chart.canvas_rect;
        let txt_height = measurer.measure("88").height;

        self.frame.render_x = !(chart.x_axis.opts.no_gridlines
            && chart.x_axis.opts.no_tick_marks
            && chart.x_axis.opts.no_tick_labels);
        for i in 0..Y_AXIS_COUNT {
            self.frame.render_y[i] = present[i]
                && !(chart.y_axis[i].opts.no_gridlines
                    && chart.y_axis[i].opts.no_tick_marks
                    && chart.y_axis[i].opts.no_tick_labels);
        }

        let pad_top = if title.is_empty() {
            0.0
        } else {
            txt_height + LABEL_PADDING
        };
        let pad_bot = if self.frame.x_state.has_labels {
            // Time axes draw a second, coarse label row.
            txt_height
                + LABEL_PADDING
                + if chart.x_axis.opts.time_scale {
                    txt_height + LABEL_PADDING
                } else {
                    0.0
                }
        } else {
            0.0
        };
        let plot_height = canvas.height() - pad_top - pad_bot;

        self.frame.custom_x = next.custom_x;
        self.frame.custom_y = next.custom_y;
        for i in 0..Y_AXIS_COUNT {
            if self.frame.render_y[i] {
                gen_axis_ticks(
                    &mut self.frame.y_ticks[i],
                    &chart.y_axis[i],
                    self.frame.custom_y[i].as_ref(),
                    plot_height,
                    true,
                    measurer,
                );
            }
        }

        let y_label_width = |i: usize, frame: &FrameState| {
            if present[i] && frame.y_state[i].has_labels {
                frame.y_ticks[i].max_label_size().width
            } else {
                0.0
            }
        };
        let pad_left = if self.frame.y_state[0].has_labels {
            self.frame.y_ticks[0].max_label_size().width + LABEL_PADDING
        } else {
            0.0
        };
        let w1 = y_label_width(1, &self.frame);
        let w2 = y_label_width(2, &self.frame);
        let pad_right = (if present[1] && self.frame.y_state[1].has_labels {
            w1 + LABEL_PADDING
        } else {
            0.0
        }) + (if present[1] && present[2] {
            LABEL_PADDING + MINOR_TICK_LEN
        } else {
            0.0
        }) + (if present[2] && self.frame.y_state[2].has_labels {
            w2 + LABEL_PADDING
        } else {
            0.0
        });
        let plot_width = canvas.width() - pad_left - pad_right;

        chart.plot_rect = Rect::new(
            canvas.x0 + pad_left,
            canvas.y0 + pad_top,
            canvas.x1 - pad_right,
            canvas.y1 - pad_bot,
        );
        let plot = chart.plot_rect;

        // Hover resolution.
        let pointer = input.pointer;
        self.frame.hov_frame = frame_rect.contains(pointer);
        self.frame.hov_plot = plot.contains(pointer);

        let x_region = Rect::new(plot.x0, plot.y1, plot.x1, frame_rect.y1);
        chart.x_axis.hovered_ext = x_region.contains(pointer);
        chart.x_axis.hovered_tot = chart.x_axis.hovered_ext || self.frame.hov_plot;

        // Right-hand gutters stack: axis 1 sits against the plot, axis 2
        // beyond it once both are present.
        let y_ref_2 = if !present[1] {
            plot.x1
        } else {
            plot.x1
                + if self.frame.y_state[1].has_labels {
                    LABEL_PADDING + w1
                } else {
                    0.0
                }
                + LABEL_PADDING
                + MINOR_TICK_LEN
        };
        let y_regions = [
            Rect::new(frame_rect.x0, plot.y0, plot.x0, plot.y1),
            if present[2] {
                Rect::new(plot.x1, plot.y0, y_ref_2, plot.y1)
            } else {
                Rect::new(plot.x1, plot.y0, frame_rect.x1, plot.y1)
            },
            Rect::new(y_ref_2, plot.y0, frame_rect.x1, plot.y1),
        ];
        for i in 0..Y_AXIS_COUNT {
            chart.y_axis[i].hovered_ext = present[i] && y_regions[i].contains(pointer);
            chart.y_axis[i].hovered_tot = chart.y_axis[i].hovered_ext || self.frame.hov_plot;
        }

        self.frame.hov_query = self.frame.hov_frame
            && self.frame.hov_plot
            && chart.queried
            && !chart.querying
            && (chart.query_rect + plot.origin().to_vec2()).contains(pointer);

        // Interaction stages, in priority order.
        Self::stage_query_drag(chart, &mut self.frame, &self.input_map);
        Self::stage_pan(chart, &mut self.frame, &self.input_map);
        Self::stage_zoom(chart, &mut self.frame);
        Self::stage_select_query(chart, &mut self.frame, &self.input_map);
        Self::stage_fit(chart, &mut self.frame, &self.input_map);
        if next.fit_x {
            self.frame.fit_this_frame = true;
            self.frame.fit_x = true;
        }
        for i in 0..Y_AXIS_COUNT {
            if next.fit_y[i] {
                self.frame.fit_this_frame = true;
                self.frame.fit_y[i] = true;
            }
        }

        // Final ticks for the now-current ranges. The tentative Y pass above
        // only existed to size the gutters.
        for i in 0..Y_AXIS_COUNT {
            if self.frame.render_y[i] {
                gen_axis_ticks(
                    &mut self.frame.y_ticks[i],
                    &chart.y_axis[i],
                    self.frame.custom_y[i].as_ref(),
                    plot_height,
                    true,
                    measurer,
                );
            }
        }
        if self.frame.render_x {
            gen_axis_ticks(
                &mut self.frame.x_ticks,
                &chart.x_axis,
                self.frame.custom_x.as_ref(),
                plot_width,
                false,
                measurer,
            );
        }

        // Transform cache for the frame's final ranges and rectangle, then
        // pixel positions for everything derived from it.
        self.frame.transforms.update(chart, self.frame.scales);
        for i in 0..Y_AXIS_COUNT {
            self.frame.pointer_plot[i] = self.frame.transforms.pixels_to_plot(pointer, i);
        }
        let transforms = &self.frame.transforms;
        self.frame
            .x_ticks
            .set_pixel_positions(|v| transforms.plot_to_pixels(v, 0.0, 0).x);
        for i in 0..Y_AXIS_COUNT {
            let transforms = &self.frame.transforms;
            self.frame.y_ticks[i].set_pixel_positions(|v| transforms.plot_to_pixels(0.0, v, i).y);
        }

        self.current = Some(id);
        true
    }

    /// Ends the chart frame: applies any deferred fit against the extents the
    /// renderer accumulated, derives a context-menu request, pushes linked
    /// bounds back out, and resets the per-frame scratch.
    pub fn end_chart(&mut self) -> Option<ContextMenuTarget> {
        debug_assert!(
            self.current.is_some(),
            "mismatched begin_chart/end_chart: end_chart with no chart open"
        );
        let Some(id) = self.current.take() else {
            return None;
        };
        let Some(chart) = self.charts.get_mut(&id) else {
            return None;
        };
        let frame = &mut self.frame;

        // Deferred fit: only axes whose fit was requested, only unlocked
        // bounds, and only if anything contributed extents this frame.
        if frame.fit_this_frame && (frame.visible_items > 0 || chart.queried) {
            let eps = f64::from(f32::EPSILON);
            if frame.fit_x {
                if !chart.x_axis.opts.lock_min && frame.extents_x.min.is_finite() {
                    chart.x_axis.range.min = frame.extents_x.min;
                }
                if !chart.x_axis.opts.lock_max && frame.extents_x.max.is_finite() {
                    chart.x_axis.range.max = frame.extents_x.max;
                }
            }
            if chart.x_axis.range.size() <= 2.0 * eps {
                chart.x_axis.range.min -= eps;
                chart.x_axis.range.max += eps;
            }
            chart.x_axis.constrain();
            for i in 0..Y_AXIS_COUNT {
                if frame.fit_y[i] {
                    if !chart.y_axis[i].opts.lock_min && frame.extents_y[i].min.is_finite() {
                        chart.y_axis[i].range.min = frame.extents_y[i].min;
                    }
                    if !chart.y_axis[i].opts.lock_max && frame.extents_y[i].max.is_finite() {
                        chart.y_axis[i].range.max = frame.extents_y[i].max;
                    }
                }
                if chart.y_axis[i].range.size() <= 2.0 * eps {
                    chart.y_axis[i].range.min -= eps;
                    chart.y_axis[i].range.max += eps;
                }
                chart.y_axis[i].constrain();
            }
            debug!(
                x = frame.fit_x,
                y0 = frame.fit_y[0],
                y1 = frame.fit_y[1],
                y2 = frame.fit_y[2],
                "fit applied"
            );
        }

        // Context-menu request, surfaced to the host rather than opening
        // anything here.
        let input = frame.input;
        let mut menu = None;
        if chart.opts.menus
            && frame.hov_frame
            && input.double_clicked(self.input_map.context_menu_button)
        {
            if frame.hov_plot {
                menu = Some(ContextMenuTarget::Plot);
            } else if chart.x_axis.hovered_ext {
                menu = Some(ContextMenuTarget::XAxis);
            } else {
                for i in 0..Y_AXIS_COUNT {
                    if chart.y_axis[i].hovered_ext {
                        menu = Some(ContextMenuTarget::YAxis(i));
                        break;
                    }
                }
            }
        }

        chart.x_axis.push_linked();
        for axis in &chart.y_axis {
            axis.push_linked();
        }

        frame.reset();
        menu
    }

    // --- interaction stages ------------------------------------------------

    /// Stage 1: a previously retained query rectangle can be dragged with the
    /// pan button; it moves with the pointer and consumes the press.
    fn stage_query_drag(chart: &mut Chart, frame: &mut FrameState, map: &InputMap) {
        let input = &frame.input;
        if chart.dragging_query
            && (input.released(map.pan_button) || !input.down(map.pan_button))
        {
            trace!("query drag end");
            chart.dragging_query = false;
        }
        if chart.dragging_query {
            chart.query_rect = chart.query_rect + input.pointer_delta;
        }
        if frame.hov_frame
            && frame.hov_plot
            && frame.hov_query
            && !chart.dragging_query
            && !chart.selecting
        {
            let any_y_dragging = chart.y_axis.iter().any(|a| a.dragging);
            if input.down(map.pan_button) && !chart.x_axis.dragging && !any_y_dragging {
                trace!("query drag begin");
                chart.dragging_query = true;
            }
        }
    }

    /// Stage 2: axis/plot panning. The data under the pointer at press time
    /// stays under the pointer by solving the inverse transform against the
    /// pre-move plot corners each frame.
    fn stage_pan(chart: &mut Chart, frame: &mut FrameState, map: &InputMap) {
        let input = frame.input;
        let released = input.released(map.pan_button) || !input.down(map.pan_button);
        if chart.x_axis.dragging && released {
            trace!("pan end (x)");
            chart.x_axis.dragging = false;
            chart.drag_max_dist_sq = 0.0;
        }
        for axis in &mut chart.y_axis {
            if axis.dragging && released {
                trace!("pan end (y)");
                axis.dragging = false;
                chart.drag_max_dist_sq = 0.0;
            }
        }
        let any_y_dragging = chart.y_axis.iter().any(|a| a.dragging);
        let drag_in_progress = chart.x_axis.dragging || any_y_dragging;

        if drag_in_progress {
            frame.transforms.update(chart, frame.scales);
            let plot = chart.plot_rect;
            let delta = input.pointer_delta;
            if !frame.x_state.lock && chart.x_axis.dragging {
                let tl = frame
                    .transforms
                    .pixels_to_plot(Point::new(plot.x0, plot.y0) - delta, 0);
                let br = frame
                    .transforms
                    .pixels_to_plot(Point::new(plot.x1, plot.y1) - delta, 0);
                if !frame.x_state.lock_min {
                    chart
                        .x_axis
                        .set_min(if frame.x_state.invert { br.x } else { tl.x });
                }
                if !frame.x_state.lock_max {
                    chart
                        .x_axis
                        .set_max(if frame.x_state.invert { tl.x } else { br.x });
                }
            }
            for i in 0..Y_AXIS_COUNT {
                if !frame.y_state[i].lock && chart.y_axis[i].dragging {
                    let tl = frame
                        .transforms
                        .pixels_to_plot(Point::new(plot.x0, plot.y0) - delta, i);
                    let br = frame
                        .transforms
                        .pixels_to_plot(Point::new(plot.x1, plot.y1) - delta, i);
                    if !frame.y_state[i].lock_min {
                        chart.y_axis[i].set_min(if frame.y_state[i].invert {
                            tl.y
                        } else {
                            br.y
                        });
                    }
                    if !frame.y_state[i].lock_max {
                        chart.y_axis[i].set_max(if frame.y_state[i].invert {
                            br.y
                        } else {
                            tl.y
                        });
                    }
                }
            }
            chart.drag_max_dist_sq = chart
                .drag_max_dist_sq
                .max((input.pointer - chart.drag_press).hypot2());
        }

        // Start drags on a fresh press over the plot or an axis region, as
        // long as no other gesture owns the pointer.
        if !drag_in_progress
            && frame.hov_frame
            && input.clicked(map.pan_button)
            && input.modifiers.contains(map.pan_mod)
            && !chart.selecting
            && !frame.hov_query
            && !chart.dragging_query
        {
            let mut started = false;
            if chart.x_axis.hovered_tot {
                chart.x_axis.dragging = true;
                started = true;
            }
            for axis in &mut chart.y_axis {
                if axis.hovered_tot {
                    axis.dragging = true;
                    started = true;
                }
            }
            if started {
                trace!("pan begin");
                chart.drag_press = input.pointer;
                chart.drag_started_frame = input.frame;
                chart.drag_max_dist_sq = 0.0;
            }
        }
    }

    /// Stage 3: wheel zoom about the pointer's normalized plot position. The
    /// rate's sign flip for zooming in keeps in/out steps reciprocal.
    fn stage_zoom(chart: &mut Chart, frame: &mut FrameState) {
        let input = frame.input;
        let any_hov_y = chart.y_axis.iter().any(|a| a.hovered_tot);
        if !(frame.hov_frame && (chart.x_axis.hovered_tot || any_hov_y) && input.wheel != 0.0) {
            return;
        }
        frame.transforms.update(chart, frame.scales);
        let mut rate = ZOOM_RATE;
        if input.wheel > 0.0 {
            rate = -rate / (1.0 + 2.0 * rate);
        }
        let plot = chart.plot_rect;
        let tx = (input.pointer.x - plot.x0) / plot.width();
        let ty = (input.pointer.y - plot.y0) / plot.height();
        let zoomed = |frame: &FrameState, i: usize| {
            let tl = frame.transforms.pixels_to_plot(
                Point::new(
                    plot.x0 - plot.width() * tx * rate,
                    plot.y0 - plot.height() * ty * rate,
                ),
                i,
            );
            let br = frame.transforms.pixels_to_plot(
                Point::new(
                    plot.x1 + plot.width() * (1.0 - tx) * rate,
                    plot.y1 + plot.height() * (1.0 - ty) * rate,
                ),
                i,
            );
            (tl, br)
        };
        if chart.x_axis.hovered_tot && !frame.x_state.lock {
            trace!("zoom (x)");
            let (tl, br) = zoomed(frame, 0);
            if !frame.x_state.lock_min {
                chart
                    .x_axis
                    .set_min(if frame.x_state.invert { br.x } else { tl.x });
            }
            if !frame.x_state.lock_max {
                chart
                    .x_axis
                    .set_max(if frame.x_state.invert { tl.x } else { br.x });
            }
        }
        for i in 0..Y_AXIS_COUNT {
            if chart.y_axis[i].hovered_tot && !frame.y_state[i].lock {
                trace!(axis = i, "zoom (y)");
                let (tl, br) = zoomed(frame, i);
                if !frame.y_state[i].lock_min {
                    chart.y_axis[i].set_min(if frame.y_state[i].invert {
                        tl.y
                    } else {
                        br.y
                    });
                }
                if !frame.y_state[i].lock_max {
                    chart.y_axis[i].set_max(if frame.y_state[i].invert {
                        br.y
                    } else {
                        tl.y
                    });
                }
            }
        }
    }

    /// Stages 4 and 5: box select and the retained query rectangle, including
    /// the modifier that toggles an active selection into a query and back.
    fn stage_select_query(chart: &mut Chart, frame: &mut FrameState, map: &InputMap) {
        let input = frame.input;
        let plot = chart.plot_rect;
        let mods = input.modifiers;

        // Confirm an active selection on release.
        if chart.selecting
            && (input.released(map.box_select_button) || !input.down(map.box_select_button))
        {
            frame.transforms.update(chart, frame.scales);
            let select_size = chart.select_start - input.pointer;
            if chart.opts.box_select {
                // The horizontal modifier restricts the commit to X, the
                // vertical modifier to Y.
                let x_can_change =
                    !mods.contains(map.vertical_mod) && select_size.x.abs() > MIN_SELECT_PX;
                let y_can_change =
                    !mods.contains(map.horizontal_mod) && select_size.y.abs() > MIN_SELECT_PX;
                let p1 = frame.transforms.pixels_to_plot(chart.select_start, 0);
                let p2 = frame.transforms.pixels_to_plot(input.pointer, 0);
                if !frame.x_state.lock_min && x_can_change {
                    chart.x_axis.set_min(p1.x.min(p2.x));
                }
                if !frame.x_state.lock_max && x_can_change {
                    chart.x_axis.set_max(p1.x.max(p2.x));
                }
                for i in 0..Y_AXIS_COUNT {
                    let p1 = frame.transforms.pixels_to_plot(chart.select_start, i);
                    let p2 = frame.transforms.pixels_to_plot(input.pointer, i);
                    if !frame.y_state[i].lock_min && y_can_change {
                        chart.y_axis[i].set_min(p1.y.min(p2.y));
                    }
                    if !frame.y_state[i].lock_max && y_can_change {
                        chart.y_axis[i].set_max(p1.y.max(p2.y));
                    }
                }
                trace!("box select commit");
            }
            chart.selecting = false;
        }
        // Cancel without applying.
        if chart.selecting
            && (input.clicked(map.box_select_cancel_button)
                || input.down(map.box_select_cancel_button))
        {
            trace!("box select cancel");
            chart.selecting = false;
        }
        // Begin a selection (also the entry point for the query toggle).
        if frame.hov_frame
            && frame.hov_plot
            && input.clicked(map.box_select_button)
            && mods.contains(map.box_select_mod)
        {
            trace!("box select begin");
            chart.select_start = input.pointer;
            chart.selecting = true;
        }

        // Track an active query rectangle; the restriction modifiers expand
        // it to the full plot extent in the other dimension.
        if chart.querying {
            frame.transforms.update(chart, frame.scales);
            let (min_x, max_x) = if mods.contains(map.vertical_mod) {
                (plot.x0, plot.x1)
            } else {
                (
                    chart.query_start.x.min(input.pointer.x),
                    chart.query_start.x.max(input.pointer.x),
                )
            };
            let (min_y, max_y) = if mods.contains(map.horizontal_mod) {
                (plot.y0, plot.y1)
            } else {
                (
                    chart.query_start.y.min(input.pointer.y),
                    chart.query_start.y.max(input.pointer.y),
                )
            };
            chart.query_rect = Rect::new(
                min_x - plot.x0,
                min_y - plot.y0,
                max_x - plot.x0,
                max_y - plot.y0,
            );
        }
        // End the query; it is retained only if it has real extent.
        if chart.querying
            && (input.released(map.query_button) || input.released(map.box_select_button))
        {
            chart.querying = false;
            chart.queried = chart.query_rect.width() > MIN_QUERY_PX
                && chart.query_rect.height() > MIN_QUERY_PX;
            trace!(retained = chart.queried, "query end");
        }
        // Begin a query.
        if chart.opts.query
            && frame.hov_frame
            && frame.hov_plot
            && input.clicked(map.query_button)
            && mods.contains(map.query_mod)
        {
            trace!("query begin");
            chart.query_rect = Rect::ZERO;
            chart.querying = true;
            chart.queried = true;
            chart.query_start = input.pointer;
        }
        // Toggle an active selection into a query while the modifier is held.
        if chart.opts.query && chart.selecting && mods.contains(map.query_toggle_mod) {
            trace!("select -> query toggle");
            chart.selecting = false;
            chart.query_rect = Rect::ZERO;
            chart.querying = true;
            chart.queried = true;
            chart.query_start = chart.select_start;
        }
        // And back to a selection once the modifier is released, as long as
        // the dedicated query button is not what started it.
        if chart.opts.box_select
            && chart.querying
            && !mods.contains(map.query_toggle_mod)
            && !input.down(map.query_button)
        {
            trace!("query -> select toggle");
            chart.selecting = true;
            chart.querying = false;
            chart.queried = false;
            chart.query_rect = Rect::ZERO;
        }
        // A chart without the query feature retains nothing.
        if !chart.opts.query {
            chart.queried = false;
            chart.querying = false;
            chart.query_rect = Rect::ZERO;
        }
    }

    /// Stage 6 (request half): double-clicking over the plot or an axis
    /// region asks for a fit of exactly the hovered axes. Application is
    /// deferred to `end_chart`.
    fn stage_fit(chart: &mut Chart, frame: &mut FrameState, map: &InputMap) {
        let input = frame.input;
        let any_hov_y = chart.y_axis.iter().any(|a| a.hovered_tot);
        if input.double_clicked(map.fit_button)
            && frame.hov_frame
            && (chart.x_axis.hovered_tot || any_hov_y)
            && !frame.hov_query
        {
            trace!("fit requested");
            frame.fit_this_frame = true;
            frame.fit_x = chart.x_axis.hovered_tot;
            for i in 0..Y_AXIS_COUNT {
                frame.fit_y[i] = chart.y_axis[i].hovered_tot;
            }
        }
    }

    // --- in-frame services -------------------------------------------------

    fn current_chart(&self) -> Option<&Chart> {
        self.charts.get(self.current.as_ref()?)
    }

    /// Selects the Y axis that subsequent renderer calls refer to.
    pub fn set_current_y_axis(&mut self, y_axis: usize) {
        debug_assert!(
            self.current.is_some(),
            "set_current_y_axis must be called between begin_chart and end_chart"
        );
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        if let Some(id) = self.current {
            if let Some(chart) = self.charts.get_mut(&id) {
                chart.current_y = y_axis.min(Y_AXIS_COUNT - 1);
            }
        }
    }

    fn resolve_y(&self, y_axis: Option<usize>) -> usize {
        debug_assert!(
            y_axis.is_none_or(|i| i < Y_AXIS_COUNT),
            "y axis index out of range"
        );
        y_axis
            .or_else(|| self.current_chart().map(|c| c.current_y))
            .unwrap_or(0)
            .min(Y_AXIS_COUNT - 1)
    }

    /// Maps a data-space point to pixels through the frame's cached
    /// transform. `None` selects the current Y axis.
    pub fn plot_to_pixels(&self, x: f64, y: f64, y_axis: Option<usize>) -> Point {
        debug_assert!(
            self.current.is_some(),
            "plot_to_pixels must be called between begin_chart and end_chart"
        );
        self.frame
            .transforms
            .plot_to_pixels(x, y, self.resolve_y(y_axis))
    }

    /// Maps a pixel position to data space through the frame's cached
    /// transform. `None` selects the current Y axis.
    pub fn pixels_to_plot(&self, pix: Point, y_axis: Option<usize>) -> PlotPoint {
        debug_assert!(
            self.current.is_some(),
            "pixels_to_plot must be called between begin_chart and end_chart"
        );
        self.frame
            .transforms
            .pixels_to_plot(pix, self.resolve_y(y_axis))
    }

    /// Extents accumulator: renderers call this once per plotted point so the
    /// deferred fit has data to act on. Non-finite input is ignored, as are
    /// non-positive values on log-scaled axes.
    pub fn fit_point(&mut self, p: PlotPoint) {
        debug_assert!(
            self.current.is_some(),
            "fit_point must be called between begin_chart and end_chart"
        );
        let Some(chart) = self.current_chart() else {
            return;
        };
        let y = chart.current_y;
        let log_x = chart.x_axis.opts.log_scale;
        let log_y = chart.y_axis[y].opts.log_scale;
        let ex = &mut self.frame.extents_x;
        if p.x.is_finite() && !(log_x && p.x <= 0.0) {
            ex.min = ex.min.min(p.x);
            ex.max = ex.max.max(p.x);
        }
        let ey = &mut self.frame.extents_y[y];
        if p.y.is_finite() && !(log_y && p.y <= 0.0) {
            ey.min = ey.min.min(p.y);
            ey.max = ey.max.max(p.y);
        }
    }

    /// Counts an item as visible this frame; deferred fit only applies when
    /// at least one item (or a retained query) contributed.
    pub fn register_visible_item(&mut self) {
        debug_assert!(
            self.current.is_some(),
            "register_visible_item must be called between begin_chart and end_chart"
        );
        self.frame.visible_items += 1;
    }

    /// The finalized X tick collection for this frame.
    pub fn x_ticks(&self) -> &TickCollection {
        debug_assert!(
            self.current.is_some(),
            "x_ticks must be called between begin_chart and end_chart"
        );
        &self.frame.x_ticks
    }

    /// The finalized tick collection for one Y axis.
    pub fn y_ticks(&self, y_axis: usize) -> &TickCollection {
        debug_assert!(
            self.current.is_some(),
            "y_ticks must be called between begin_chart and end_chart"
        );
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        &self.frame.y_ticks[y_axis.min(Y_AXIS_COUNT - 1)]
    }

    /// The plot-area pixel rectangle.
    pub fn plot_rect(&self) -> Rect {
        self.current_chart().map(|c| c.plot_rect).unwrap_or_default()
    }

    /// Whether the pointer is over the plot area.
    pub fn is_plot_hovered(&self) -> bool {
        self.frame.hov_frame && self.frame.hov_plot
    }

    /// Whether the pointer is over the X axis region.
    pub fn is_x_axis_hovered(&self) -> bool {
        self.current_chart()
            .map(|c| c.x_axis.hovered_ext)
            .unwrap_or(false)
    }

    /// Whether the pointer is over a Y axis region.
    pub fn is_y_axis_hovered(&self, y_axis: usize) -> bool {
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        self.current_chart()
            .map(|c| c.y_axis[y_axis.min(Y_AXIS_COUNT - 1)].hovered_ext)
            .unwrap_or(false)
    }

    /// The pointer position in data space against one Y axis.
    pub fn pointer_plot_pos(&self, y_axis: Option<usize>) -> PlotPoint {
        debug_assert!(
            self.current.is_some(),
            "pointer_plot_pos must be called between begin_chart and end_chart"
        );
        self.frame.pointer_plot[self.resolve_y(y_axis)]
    }

    /// The visible X and Y ranges against one Y axis.
    pub fn chart_limits(&self, y_axis: Option<usize>) -> (Range, Range) {
        let y = self.resolve_y(y_axis);
        self.current_chart()
            .map(|c| (c.x_axis.range, c.y_axis[y].range))
            .unwrap_or_default()
    }

    /// Whether the current chart holds a retained query rectangle.
    pub fn is_chart_queried(&self) -> bool {
        self.current_chart().map(|c| c.queried).unwrap_or(false)
    }

    /// The retained query rectangle as data-space ranges against one Y axis.
    pub fn query_bounds(&self, y_axis: Option<usize>) -> (Range, Range) {
        debug_assert!(
            self.current.is_some(),
            "query_bounds must be called between begin_chart and end_chart"
        );
        let y = self.resolve_y(y_axis);
        let Some(chart) = self.current_chart() else {
            return (Range::default(), Range::default());
        };
        let origin = chart.plot_rect.origin().to_vec2();
        let p1 = self
            .frame
            .transforms
            .pixels_to_plot(Point::new(chart.query_rect.x0, chart.query_rect.y0) + origin, y);
        let p2 = self
            .frame
            .transforms
            .pixels_to_plot(Point::new(chart.query_rect.x1, chart.query_rect.y1) + origin, y);
        (
            Range::new(p1.x.min(p2.x), p1.x.max(p2.x)),
            Range::new(p1.y.min(p2.y), p1.y.max(p2.y)),
        )
    }

    /// The resolved scale pairing for one Y axis this frame.
    pub fn axis_scale(&self, y_axis: usize) -> AxisScale {
        debug_assert!(y_axis < Y_AXIS_COUNT, "y axis index out of range");
        self.frame.scales[y_axis.min(Y_AXIS_COUNT - 1)]
    }

    /// Formats the hovered data coordinates for an inlay readout: scientific
    /// on log axes, unit-scoped calendar text on time axes, tick-precision
    /// decimals otherwise. `None` when the plot is not hovered.
    pub fn hover_readout(&self) -> Option<String> {
        let chart = self.current_chart()?;
        if !(self.frame.hov_frame && self.frame.hov_plot) {
            return None;
        }
        let mut out = String::new();
        let pos = self.frame.pointer_plot[0];
        if chart.x_axis.opts.log_scale {
            out.push_str(&format_scientific(pos.x));
        } else if chart.x_axis.opts.time_scale {
            let unit = TimeUnit::for_span(
                chart.x_axis.range.size() / (chart.plot_rect.width() / 100.0),
            );
            out.push_str(&Instant::from_f64(pos.x).format(TimeFmt::cursor(unit)));
        } else {
            let spacing = tick_spacing(&self.frame.x_ticks, chart.x_axis.range);
            out.push_str(&format!("{:.*}", precision(spacing), pos.x));
        }
        let present = [true, chart.opts.y_axis_2, chart.opts.y_axis_3];
        for i in 0..Y_AXIS_COUNT {
            if !present[i] {
                continue;
            }
            let pos = self.frame.pointer_plot[i];
            let text = if chart.y_axis[i].opts.log_scale {
                format_scientific(pos.y)
            } else {
                let spacing = tick_spacing(&self.frame.y_ticks[i], chart.y_axis[i].range);
                format!("{:.*}", precision(spacing), pos.y)
            };
            if i == 0 {
                out.push_str(&format!(",{text}"));
            } else {
                out.push_str(&format!(",({text})"));
            }
        }
        Some(out)
    }
}

/// Spacing between the first two ticks, falling back to the full range when
/// fewer than two ticks exist.
fn tick_spacing(ticks: &TickCollection, range: Range) -> f64 {
    let mut it = ticks.iter();
    match (it.next(), it.next()) {
        (Some(a), Some(b)) => (b.plot_pos - a.plot_pos).abs(),
        _ => range.size(),
    }
}

/// Decimal places that suit a given tick spacing.
fn precision(spacing: f64) -> usize {
    if !(spacing > 0.0) || !spacing.is_finite() {
        return 3;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "clamped to a single-digit count"
    )]
    let p = (3 - spacing.log10().trunc() as i64).clamp(0, 12);
    p as usize
}

/// Generates one axis's ticks: caller ticks first, then the generated set
/// unless the caller suppressed it.
fn gen_axis_ticks(
    ticks: &mut TickCollection,
    axis: &Axis,
    custom: Option<&CustomTicks>,
    extent_px: f64,
    vertical: bool,
    measurer: &dyn TextMeasurer,
) {
    ticks.reset();
    if let Some(custom) = custom {
        let label_refs: Option<Vec<&str>> = custom
            .labels
            .as_ref()
            .map(|l| l.iter().map(String::as_str).collect());
        ticks.add_custom(&custom.positions, label_refs.as_deref(), measurer);
        if !custom.keep_default {
            return;
        }
    }
    let range = axis.range;
    let budget_of = |b: f64| -> usize {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "tick budgets are small positive counts"
        )]
        let b = b.max(2.0) as usize;
        b
    };
    if axis.opts.time_scale && !vertical {
        ticks.add_time(range, extent_px, measurer);
    } else if axis.opts.log_scale {
        let budget = if vertical {
            (extent_px * 0.02).round()
        } else {
            (extent_px * 0.01).round()
        };
        ticks.add_log(range, budget_of(budget), measurer);
    } else {
        ticks.add_linear(range, budget_of((extent_px * 0.0025).round()), SUB_DIVS, measurer);
    }
}
