// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pointer/keyboard snapshot consumed each frame, and the gesture map
//! that binds buttons and modifiers to chart gestures.
//!
//! The engine never talks to a windowing system; the host fills an
//! [`InputState`] once per frame from whatever event source it has and passes
//! it to `begin_chart`. All gestures are pointer-state-driven; the frame
//! counter exists only for drag-distance bookkeeping.

use kurbo::{Point, Vec2};

/// Pointer buttons the gesture map can bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Primary button.
    Left,
    /// Middle button / wheel press.
    Middle,
    /// Secondary button.
    Right,
}

impl PointerButton {
    fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}

/// Keyboard modifier state.
///
/// A gesture binding's modifier set is satisfied when every required modifier
/// is held; extra held modifiers do not disqualify it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Shift key.
    pub shift: bool,
    /// Alt/Option key.
    pub alt: bool,
    /// Command/Windows key.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers required.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Alt only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Meta only.
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Returns true if every modifier required by `required` is held.
    pub fn contains(self, required: Self) -> bool {
        (!required.ctrl || self.ctrl)
            && (!required.shift || self.shift)
            && (!required.alt || self.alt)
            && (!required.meta || self.meta)
    }
}

/// Per-button state for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonState {
    /// Held this frame.
    pub down: bool,
    /// Went down this frame.
    pub clicked: bool,
    /// Went up this frame.
    pub released: bool,
    /// Second click of a double-click landed this frame.
    pub double_clicked: bool,
}

/// One frame's input snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    /// Pointer position in pixels.
    pub pointer: Point,
    /// Pointer movement since the previous frame, in pixels.
    pub pointer_delta: Vec2,
    /// Vertical wheel movement; positive is away from the user.
    pub wheel: f64,
    /// Held keyboard modifiers.
    pub modifiers: Modifiers,
    /// Monotonic frame counter.
    pub frame: u64,
    /// Left/middle/right button state.
    pub buttons: [ButtonState; 3],
}

impl InputState {
    /// State of one button.
    pub fn button(&self, button: PointerButton) -> ButtonState {
        self.buttons[button.index()]
    }

    /// Whether `button` is held this frame.
    pub fn down(&self, button: PointerButton) -> bool {
        self.button(button).down
    }

    /// Whether `button` went down this frame.
    pub fn clicked(&self, button: PointerButton) -> bool {
        self.button(button).clicked
    }

    /// Whether `button` went up this frame.
    pub fn released(&self, button: PointerButton) -> bool {
        self.button(button).released
    }

    /// Whether `button` double-clicked this frame.
    pub fn double_clicked(&self, button: PointerButton) -> bool {
        self.button(button).double_clicked
    }
}

/// Buttons and modifiers for every chart gesture.
///
/// The defaults pan with an unmodified left drag, box-select with a right
/// drag, query with a middle drag (or Ctrl while selecting), fit on left
/// double-click, and open context menus on right double-click. Alt restricts
/// a box select to the X axes, Shift to the Y axes.
#[derive(Clone, Copy, Debug)]
pub struct InputMap {
    /// Button that pans plots and axes while dragged.
    pub pan_button: PointerButton,
    /// Modifiers required to start a pan.
    pub pan_mod: Modifiers,
    /// Button whose double-click fits the hovered axes.
    pub fit_button: PointerButton,
    /// Button whose double-click requests a context menu.
    pub context_menu_button: PointerButton,
    /// Button that starts a box selection while dragged.
    pub box_select_button: PointerButton,
    /// Modifiers required to start a box selection.
    pub box_select_mod: Modifiers,
    /// Button that cancels an active box selection.
    pub box_select_cancel_button: PointerButton,
    /// Button that starts a query rectangle while dragged.
    pub query_button: PointerButton,
    /// Modifiers required to start a query rectangle.
    pub query_mod: Modifiers,
    /// Modifier that converts an active box selection into a query.
    pub query_toggle_mod: Modifiers,
    /// Modifier that restricts a box selection to the X axes.
    pub horizontal_mod: Modifiers,
    /// Modifier that restricts a box selection to the Y axes.
    pub vertical_mod: Modifiers,
}

impl Default for InputMap {
    fn default() -> Self {
        Self {
            pan_button: PointerButton::Left,
            pan_mod: Modifiers::NONE,
            fit_button: PointerButton::Left,
            context_menu_button: PointerButton::Right,
            box_select_button: PointerButton::Right,
            box_select_mod: Modifiers::NONE,
            box_select_cancel_button: PointerButton::Left,
            query_button: PointerButton::Middle,
            query_mod: Modifiers::NONE,
            query_toggle_mod: Modifiers::CTRL,
            horizontal_mod: Modifiers::ALT,
            vertical_mod: Modifiers::SHIFT,
        }
    }
}
