// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure axis primitives for immediate-mode 2D charts.
//!
//! This crate holds the math that does not need a chart, a window, or a
//! renderer to be meaningful:
//! - **Ranges** are closed `[min, max]` intervals in data space.
//! - **Instants** are calendar-aware timestamps with microsecond resolution,
//!   used as the numeric coordinate of time-formatted axes.
//! - **Tick generation** turns a visible range plus a pixel budget into
//!   labeled major/minor tick collections for linear, logarithmic, and
//!   calendar-time axes.
//!
//! Text shaping and layout are out of scope; tick labels are unshaped strings
//! sized through a [`TextMeasurer`] callback so the runtime layer can reserve
//! axis gutters before the plot rectangle is final.

#![no_std]

extern crate alloc;

#[cfg(not(feature = "std"))]
mod float;
mod measure;
mod range;
mod ticks;
mod time;

pub use measure::{HeuristicTextMeasurer, Size, TextMeasurer};
pub use range::{Range, constrain_finite};
pub use ticks::{Tick, TickCollection, format_scientific, format_value, nice_num};
pub use time::{Instant, MAX_TIME_S, MIN_TIME_S, TimeFmt, TimeUnit};
