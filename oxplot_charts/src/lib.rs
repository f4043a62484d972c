// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immediate-mode chart runtime over `oxplot_core`.
//!
//! Every frame the host calls [`PlotContext::begin_chart`], draws its items
//! through the exposed transforms and tick collections, and calls
//! [`PlotContext::end_chart`]. Chart state persists across frames keyed by
//! name; the context is an explicit handle the caller owns, not a process
//! global.
//!
//! What happens in between is the interaction state machine: pan, zoom, box
//! select, query rectangles, and double-click fit resolve in a fixed priority
//! order against the previous frame's axis state and the current input
//! snapshot. Rendering, styling, and windowing stay on the host's side of the
//! boundary: the engine consumes an input snapshot and a text measurer, and
//! produces ranges, transforms, tick collections, and rectangles.

mod axis;
mod chart;
mod context;
mod input;
mod transform;

pub use axis::{Axis, AxisOptions};
pub use chart::{Chart, ChartId, ChartOptions};
pub use context::{Cond, ContextMenuTarget, LinkedBound, PlotContext, Y_AXIS_COUNT};
pub use input::{ButtonState, InputMap, InputState, Modifiers, PointerButton};
pub use transform::{AxisScale, PlotPoint};
