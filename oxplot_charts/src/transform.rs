// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame mapping between data space and pixel space.
//!
//! The mapping is an affine (or log-affine) function of the visible range and
//! the plot rectangle, both of which mutate during the frame (drags, zooms,
//! selection commits). [`TransformCache`] snapshots everything a conversion
//! needs; the interaction pipeline re-runs [`TransformCache::update`] before
//! any conversion in a frame segment where range or rectangle may have
//! changed. Using a stale cache is a correctness bug, not a performance one.

use kurbo::{Point, Rect};

use oxplot_core::Range;

use crate::chart::Chart;

/// A point in data space (as opposed to `kurbo::Point`, used for pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlotPoint {
    /// X in data units.
    pub x: f64,
    /// Y in data units.
    pub y: f64,
}

impl PlotPoint {
    /// Creates a new data-space point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The scale pairing of the X axis and one Y axis, resolved once per frame so
/// conversion paths match on a tag instead of re-testing axis flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisScale {
    /// Linear X, linear Y.
    #[default]
    LinLin,
    /// Log X, linear Y.
    LogLin,
    /// Linear X, log Y.
    LinLog,
    /// Log X, log Y.
    LogLog,
}

impl AxisScale {
    pub(crate) fn of(x_log: bool, y_log: bool) -> Self {
        match (x_log, y_log) {
            (false, false) => Self::LinLin,
            (true, false) => Self::LogLin,
            (false, true) => Self::LinLog,
            (true, true) => Self::LogLog,
        }
    }

    /// Whether the X axis of this pairing is logarithmic.
    pub fn x_is_log(self) -> bool {
        matches!(self, Self::LogLin | Self::LogLog)
    }

    /// Whether the Y axis of this pairing is logarithmic.
    pub fn y_is_log(self) -> bool {
        matches!(self, Self::LinLog | Self::LogLog)
    }
}

/// Pixel anchors for one X/Y axis pair. `min` is where the data-space minimum
/// lands, which is the *larger* pixel coordinate for an un-inverted Y axis.
#[derive(Clone, Copy, Debug, Default)]
struct PixelRange {
    min: Point,
    max: Point,
}

/// Cached linear factors for data↔pixel conversion, one set per Y axis.
#[derive(Clone, Debug, Default)]
pub(crate) struct TransformCache {
    pixel_range: [PixelRange; 3],
    scales: [AxisScale; 3],
    x_range: Range,
    y_range: [Range; 3],
    mx: f64,
    my: [f64; 3],
    log_den_x: f64,
    log_den_y: [f64; 3],
}

impl TransformCache {
    /// Recomputes every cached factor from the chart's current ranges and
    /// plot rectangle.
    pub(crate) fn update(&mut self, chart: &Chart, scales: [AxisScale; 3]) {
        let plot = chart.plot_rect;
        let x_inverted = chart.x_axis.opts.inverted;
        self.scales = scales;
        self.x_range = chart.x_axis.range.widened();
        self.log_den_x = (self.x_range.max / self.x_range.min).log10();
        for i in 0..3 {
            let y_inverted = chart.y_axis[i].opts.inverted;
            let pr = PixelRange {
                min: Point::new(
                    if x_inverted { plot.x1 } else { plot.x0 },
                    if y_inverted { plot.y0 } else { plot.y1 },
                ),
                max: Point::new(
                    if x_inverted { plot.x0 } else { plot.x1 },
                    if y_inverted { plot.y1 } else { plot.y0 },
                ),
            };
            self.y_range[i] = chart.y_axis[i].range.widened();
            self.my[i] = (pr.max.y - pr.min.y) / self.y_range[i].size();
            self.log_den_y[i] = (self.y_range[i].max / self.y_range[i].min).log10();
            self.pixel_range[i] = pr;
        }
        let pr = self.pixel_range[0];
        self.mx = (pr.max.x - pr.min.x) / self.x_range.size();
    }

    /// Maps a data-space point to pixels using the cached factors.
    pub(crate) fn plot_to_pixels(&self, x: f64, y: f64, y_axis: usize) -> Point {
        let scale = self.scales[y_axis];
        let xr = self.x_range;
        let yr = self.y_range[y_axis];
        let mut x = x;
        let mut y = y;
        if scale.x_is_log() {
            let t = (x / xr.min).log10() / self.log_den_x;
            x = xr.min + t * xr.size();
        }
        if scale.y_is_log() {
            let t = (y / yr.min).log10() / self.log_den_y[y_axis];
            y = yr.min + t * yr.size();
        }
        let pr = self.pixel_range[y_axis];
        Point::new(
            pr.min.x + self.mx * (x - xr.min),
            pr.min.y + self.my[y_axis] * (y - yr.min),
        )
    }

    /// Maps a pixel position back into data space using the cached factors.
    pub(crate) fn pixels_to_plot(&self, pix: Point, y_axis: usize) -> PlotPoint {
        let scale = self.scales[y_axis];
        let xr = self.x_range;
        let yr = self.y_range[y_axis];
        let pr = self.pixel_range[y_axis];
        let mut x = (pix.x - pr.min.x) / self.mx + xr.min;
        let mut y = (pix.y - pr.min.y) / self.my[y_axis] + yr.min;
        if scale.x_is_log() {
            let t = (x - xr.min) / xr.size();
            x = 10_f64.powf(t * self.log_den_x) * xr.min;
        }
        if scale.y_is_log() {
            let t = (y - yr.min) / yr.size();
            y = 10_f64.powf(t * self.log_den_y[y_axis]) * yr.min;
        }
        PlotPoint::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use oxplot_core::Range;

    use super::*;
    use crate::chart::Chart;

    fn chart_with(x: Range, y: Range, plot: Rect) -> Chart {
        let mut chart = Chart::new();
        chart.x_axis.set_range(x);
        chart.y_axis[0].set_range(y);
        chart.plot_rect = plot;
        chart
    }

    #[test]
    fn linear_endpoints_map_to_plot_corners() {
        let chart = chart_with(
            Range::new(0.0, 10.0),
            Range::new(-5.0, 5.0),
            Rect::new(100.0, 50.0, 300.0, 250.0),
        );
        let mut cache = TransformCache::default();
        cache.update(&chart, [AxisScale::LinLin; 3]);
        let bl = cache.plot_to_pixels(0.0, -5.0, 0);
        let tr = cache.plot_to_pixels(10.0, 5.0, 0);
        // y grows downward on screen
        assert_eq!((bl.x, bl.y), (100.0, 250.0));
        assert_eq!((tr.x, tr.y), (300.0, 50.0));
    }

    #[test]
    fn pixel_data_pixel_round_trip_is_identity() {
        let chart = chart_with(
            Range::new(0.3, 17.7),
            Range::new(-2.0, 9.5),
            Rect::new(10.0, 20.0, 610.0, 420.0),
        );
        let mut cache = TransformCache::default();
        cache.update(&chart, [AxisScale::LinLin; 3]);
        for &(px, py) in &[(10.0, 20.0), (300.0, 200.0), (610.0, 420.0), (123.4, 56.7)] {
            let p = cache.pixels_to_plot(Point::new(px, py), 0);
            let back = cache.plot_to_pixels(p.x, p.y, 0);
            assert!((back.x - px).abs() < 1e-9, "x: {} vs {px}", back.x);
            assert!((back.y - py).abs() < 1e-9, "y: {} vs {py}", back.y);
        }
    }

    #[test]
    fn log_round_trip_is_identity() {
        let mut chart = chart_with(
            Range::new(1.0, 1000.0),
            Range::new(0.1, 10.0),
            Rect::new(0.0, 0.0, 500.0, 400.0),
        );
        chart.x_axis.opts.log_scale = true;
        chart.y_axis[0].opts.log_scale = true;
        let mut cache = TransformCache::default();
        cache.update(&chart, [AxisScale::LogLog; 3]);
        let mid = cache.plot_to_pixels(10.0, 1.0, 0);
        // log midpoints land at the pixel center
        assert!((mid.x - 250.0 * (2.0 / 3.0)).abs() < 1e-9);
        assert!((mid.y - 200.0).abs() < 1e-9);
        for &(px, py) in &[(0.0, 0.0), (250.0, 100.0), (500.0, 400.0)] {
            let p = cache.pixels_to_plot(Point::new(px, py), 0);
            let back = cache.plot_to_pixels(p.x, p.y, 0);
            assert!((back.x - px).abs() < 1e-6);
            assert!((back.y - py).abs() < 1e-6);
        }
    }

    #[test]
    fn inverted_axes_swap_pixel_anchors() {
        let mut chart = chart_with(
            Range::new(0.0, 10.0),
            Range::new(0.0, 10.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        chart.x_axis.opts.inverted = true;
        chart.y_axis[0].opts.inverted = true;
        let mut cache = TransformCache::default();
        cache.update(&chart, [AxisScale::LinLin; 3]);
        let p = cache.plot_to_pixels(0.0, 0.0, 0);
        assert_eq!((p.x, p.y), (100.0, 0.0));
    }
}
