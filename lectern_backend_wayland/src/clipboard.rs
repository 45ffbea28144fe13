// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipboard ownership through `wl_data_device`.
//!
//! Only the offering side is implemented: the viewer copies text out, it
//! never pastes. Offers made by other clients are destroyed on arrival.

use std::fs::File;
use std::io::Write;

use wayland_client::protocol::wl_data_device::{self, WlDataDevice};
use wayland_client::protocol::wl_data_device_manager::WlDataDeviceManager;
use wayland_client::protocol::wl_data_offer::WlDataOffer;
use wayland_client::protocol::wl_data_source::{self, WlDataSource};
use wayland_client::{Connection, Dispatch, QueueHandle, delegate_noop, event_created_child};

use crate::event_loop::WaylandState;

/// The one MIME type the selection is offered as.
pub(crate) const TEXT_MIME_TYPE: &str = "text/plain;charset=utf-8";

delegate_noop!(WaylandState: WlDataDeviceManager);
delegate_noop!(WaylandState: ignore WlDataOffer);

impl Dispatch<WlDataDevice, ()> for WaylandState {
    fn event(
        _state: &mut Self,
        _device: &WlDataDevice,
        event: wl_data_device::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_data_device::Event::Selection { id: Some(offer) }
            | wl_data_device::Event::Enter { id: Some(offer), .. } => offer.destroy(),
            _ => {}
        }
    }

    event_created_child!(WaylandState, WlDataDevice, [
        wl_data_device::EVT_DATA_OFFER_OPCODE => (WlDataOffer, ()),
    ]);
}

impl Dispatch<WlDataSource, ()> for WaylandState {
    fn event(
        state: &mut Self,
        source: &WlDataSource,
        event: wl_data_source::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_data_source::Event::Send { mime_type, fd } => {
                let Some(text) = state.selection.as_deref() else {
                    return;
                };
                let mut file = File::from(fd);
                if let Err(err) = file.write_all(text.as_bytes()) {
                    log::warn!("cannot send selection as {mime_type}: {err}");
                }
            }
            wl_data_source::Event::Cancelled => {
                source.destroy();
                if state.source.as_ref() == Some(source) {
                    state.source = None;
                    state.selection = None;
                }
            }
            _ => {}
        }
    }
}
