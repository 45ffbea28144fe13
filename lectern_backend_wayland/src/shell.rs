// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window-management and output handlers: registry, `xdg_shell`, frame
//! callbacks and `wl_output`.

use lectern_core::event::Event;
use wayland_client::globals::GlobalListContents;
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::{self, WlOutput};
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum, delegate_noop};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::event_loop::WaylandState;

delegate_noop!(WaylandState: WlCompositor);
delegate_noop!(WaylandState: WlShmPool);
delegate_noop!(WaylandState: ignore WlSurface);
delegate_noop!(WaylandState: ignore WlShm);
delegate_noop!(WaylandState: ignore WlBuffer);

impl Dispatch<WlRegistry, GlobalListContents> for WaylandState {
    fn event(
        _state: &mut Self,
        _registry: &WlRegistry,
        event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::GlobalRemove { name } = event {
            log::debug!("global {name} removed");
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for WaylandState {
    fn event(
        _state: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        xdg_surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg_surface.ack_configure(serial);
            state.configured = true;
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _toplevel: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure {
                width,
                height,
                states,
            } => {
                state.events.push(Event::Resize {
                    width: width.max(0).unsigned_abs(),
                    height: height.max(0).unsigned_abs(),
                    maximized: is_maximized(&states),
                });
            }
            xdg_toplevel::Event::Close => state.events.push(Event::Close),
            _ => {}
        }
    }
}

/// Decodes the toplevel state array (native-endian `u32` values) and reports
/// whether the window is maximized or fullscreen.
fn is_maximized(states: &[u8]) -> bool {
    states
        .chunks_exact(4)
        .filter_map(|chunk| chunk.try_into().ok().map(u32::from_ne_bytes))
        .any(|raw| {
            matches!(
                xdg_toplevel::State::try_from(raw),
                Ok(xdg_toplevel::State::Maximized | xdg_toplevel::State::Fullscreen)
            )
        })
}

impl Dispatch<WlCallback, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _callback: &WlCallback,
        event: wl_callback::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            state.events.push(Event::FrameAck);
        }
    }
}

impl Dispatch<WlOutput, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _output: &WlOutput,
        event: wl_output::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_output::Event::Geometry { physical_width, .. } => {
                state.output.physical_width_mm = physical_width;
            }
            wl_output::Event::Mode {
                flags: WEnum::Value(flags),
                width,
                ..
            } if flags.contains(wl_output::Mode::Current) => {
                state.output.width = width;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_maximized;

    fn encode(states: &[u32]) -> Vec<u8> {
        states.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn maximized_and_fullscreen_are_detected() {
        // 1 = maximized, 2 = fullscreen, 4 = activated.
        assert!(is_maximized(&encode(&[4, 1])));
        assert!(is_maximized(&encode(&[2])));
    }

    #[test]
    fn other_states_are_not_maximized() {
        assert!(!is_maximized(&encode(&[4, 3])), "activated and resizing");
        assert!(!is_maximized(&[]));
    }

    #[test]
    fn trailing_partial_entry_is_ignored() {
        let mut bytes = encode(&[4]);
        bytes.extend_from_slice(&[1, 0]);
        assert!(!is_maximized(&bytes));
    }
}
