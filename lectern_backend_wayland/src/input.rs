// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seat, keyboard and pointer handlers.

use lectern_core::event::{Button, Event, Modifiers};
use wayland_client::protocol::wl_keyboard::{self, WlKeyboard};
use wayland_client::protocol::wl_pointer::{self, WlPointer};
use wayland_client::protocol::wl_seat::{self, WlSeat};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use crate::event_loop::WaylandState;

const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;
const BTN_MIDDLE: u32 = 0x112;

/// Axis units per synthesized wheel click.
const WHEEL_STEP: usize = 10;

impl Dispatch<WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(caps),
        } = event
        else {
            return;
        };
        if caps.contains(wl_seat::Capability::Keyboard) && state.keyboard.is_none() {
            state.keyboard = Some(seat.get_keyboard(qh, ()));
        }
        if caps.contains(wl_seat::Capability::Pointer) && state.pointer_device.is_none() {
            state.pointer_device = Some(seat.get_pointer(qh, ()));
        }
    }
}

impl Dispatch<WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _keyboard: &WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_keyboard::Event::Keymap {
                format: WEnum::Value(wl_keyboard::KeymapFormat::XkbV1),
                fd,
                size,
            } => state.keys.load_fd(fd, size),
            wl_keyboard::Event::Keymap { .. } => {
                log::warn!("compositor sent a keymap that is not XKB; typing is disabled");
            }
            wl_keyboard::Event::Key {
                serial,
                key,
                state: WEnum::Value(wl_keyboard::KeyState::Pressed),
                ..
            } => {
                state.serial = serial;
                if let Some(event) = state.keys.press(key) {
                    state.events.push(event);
                }
            }
            wl_keyboard::Event::Modifiers {
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
                ..
            } => state
                .keys
                .update_modifiers(mods_depressed, mods_latched, mods_locked, group),
            // The compositor resends modifiers on the next enter.
            wl_keyboard::Event::Leave { .. } => state.keys.update_modifiers(0, 0, 0, 0),
            _ => {}
        }
    }
}

impl Dispatch<WlPointer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _pointer: &WlPointer,
        event: wl_pointer::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_pointer::Event::Enter {
                surface_x,
                surface_y,
                ..
            }
            | wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => {
                let (x, y) = (to_px(surface_x), to_px(surface_y));
                state.pointer = (x, y);
                state.events.push(Event::PointerMotion { x, y });
            }
            wl_pointer::Event::Button {
                serial,
                button,
                state: WEnum::Value(button_state),
                ..
            } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                let pressed = button_state == wl_pointer::ButtonState::Pressed;
                if pressed {
                    state.serial = serial;
                }
                let (x, y) = state.pointer;
                state.events.push(Event::PointerButton {
                    x,
                    y,
                    button,
                    pressed,
                    modifiers: state.keys.modifiers(),
                });
            }
            wl_pointer::Event::Axis {
                axis: WEnum::Value(axis),
                value,
                ..
            } => {
                let (x, y) = state.pointer;
                let modifiers = state.keys.modifiers();
                state
                    .events
                    .extend(wheel_clicks(axis, value, x, y, modifiers));
            }
            _ => {}
        }
    }
}

fn map_button(code: u32) -> Option<Button> {
    match code {
        BTN_LEFT => Some(Button::Left),
        BTN_RIGHT => Some(Button::Right),
        BTN_MIDDLE => Some(Button::Middle),
        _ => None,
    }
}

/// Turns one axis event into wheel presses, one per started step of
/// [`WHEEL_STEP`] units.
fn wheel_clicks(
    axis: wl_pointer::Axis,
    value: f64,
    x: i32,
    y: i32,
    modifiers: Modifiers,
) -> impl Iterator<Item = Event> {
    let amount = to_px(value);
    let button = match (axis, amount < 0) {
        (wl_pointer::Axis::HorizontalScroll, true) => Button::WheelLeft,
        (wl_pointer::Axis::HorizontalScroll, false) => Button::WheelRight,
        (_, true) => Button::WheelUp,
        (_, false) => Button::WheelDown,
    };
    let units = usize::try_from(amount.unsigned_abs()).unwrap_or(usize::MAX);
    (0..units).step_by(WHEEL_STEP).map(move |_| Event::PointerButton {
        x,
        y,
        button,
        pressed: true,
        modifiers,
    })
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "surface coordinates and scroll amounts fit in i32; `as` truncates toward zero and saturates"
)]
fn to_px(value: f64) -> i32 {
    value as i32
}
