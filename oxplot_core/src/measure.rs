// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement hooks for tick layout.
//!
//! Axis gutters have to be sized from tick label extents before the plot
//! rectangle is known, so tick generation accepts a measurer callback instead
//! of talking to a font stack directly. Hosts plug in their real text metrics;
//! [`HeuristicTextMeasurer`] exists for tests and early bring-up.

/// A width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A minimal text measurement interface used by tick generation.
///
/// Returned extents are for a single line of unrotated text in whatever font
/// the host renders tick labels with.
pub trait TextMeasurer {
    /// Returns the pixel extents of `text`.
    fn measure(&self, text: &str) -> Size;
}

/// A tiny heuristic text measurer suitable for tests and early layout.
///
/// It assumes an average glyph width of ~0.6em and height of 1em.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicTextMeasurer {
    /// Assumed font size in pixels.
    pub font_size: f64,
}

impl Default for HeuristicTextMeasurer {
    fn default() -> Self {
        Self { font_size: 13.0 }
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str) -> Size {
        Size::new(
            0.6 * self.font_size * text.chars().count() as f64,
            self.font_size,
        )
    }
}
