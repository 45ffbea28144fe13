// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events delivered by the display connection.
//!
//! Backends translate protocol callbacks into [`Event`] values and hand them
//! to the run loop in delivery order. The loop consumes them in a single
//! dispatch function.

/// Keyboard modifier state at the time of an input event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift is held.
    pub shift: bool,
    /// Control is held.
    pub ctrl: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
    };

    /// Only control held.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
    };
}

/// A pointer button. Wheel motion is reported as presses of the wheel
/// buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    /// Primary button.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button.
    Right,
    /// One notch of upward scroll.
    WheelUp,
    /// One notch of downward scroll.
    WheelDown,
    /// One notch of leftward scroll.
    WheelLeft,
    /// One notch of rightward scroll.
    WheelRight,
}

impl Button {
    /// Returns `true` for the synthetic wheel buttons.
    #[must_use]
    pub const fn is_wheel(self) -> bool {
        matches!(
            self,
            Self::WheelUp | Self::WheelDown | Self::WheelLeft | Self::WheelRight
        )
    }
}

/// A navigation key, before it is given a meaning.
///
/// Outside search mode each one stands for a viewer command; while the
/// viewer is searching the key produces its plain text, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavKey {
    /// Escape.
    Escape,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Home.
    Home,
    /// End.
    End,
}

impl NavKey {
    /// The command character this key sends outside search mode.
    #[must_use]
    pub const fn command(self) -> char {
        match self {
            Self::Escape => '\x1b',
            Self::Up => 'k',
            Self::Down => 'j',
            Self::Left => 'b',
            Self::Right => ' ',
            Self::PageUp => ',',
            Self::PageDown => '.',
            Self::Home => 'g',
            Self::End => 'G',
        }
    }
}

/// An input or lifecycle event from the display connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A key was pressed (or auto-repeated), already mapped to a character.
    Key {
        /// The character the key produces; control keys use their ASCII
        /// control code, e.g. `'\x1b'` for Escape.
        code: char,
        /// Modifier state.
        modifiers: Modifiers,
    },
    /// A navigation key was pressed.
    NavKey {
        /// Which key.
        key: NavKey,
        /// What the key types under the current layout, used while the
        /// viewer is searching.
        text: Option<char>,
        /// Modifier state.
        modifiers: Modifiers,
    },
    /// The pointer moved over the surface.
    PointerMotion {
        /// Surface-local x in pixels.
        x: i32,
        /// Surface-local y in pixels.
        y: i32,
    },
    /// A pointer button changed state.
    PointerButton {
        /// Surface-local x in pixels.
        x: i32,
        /// Surface-local y in pixels.
        y: i32,
        /// Which button.
        button: Button,
        /// `true` for press, `false` for release.
        pressed: bool,
        /// Modifier state.
        modifiers: Modifiers,
    },
    /// The window manager configured a new size.
    Resize {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
        /// The window is maximized or fullscreen and must not resize itself.
        maximized: bool,
    },
    /// The server acknowledged the last submitted frame.
    FrameAck,
    /// The user asked to close the window.
    Close,
    /// The document should be reloaded from disk.
    Reload,
}

impl Event {
    /// Returns `true` for key presses and pointer button presses: the events
    /// that cancel a pending auto-advance.
    #[must_use]
    pub const fn is_user_press(&self) -> bool {
        matches!(
            self,
            Self::Key { .. } | Self::NavKey { .. } | Self::PointerButton { pressed: true, .. }
        )
    }
}
