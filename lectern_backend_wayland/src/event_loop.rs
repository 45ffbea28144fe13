// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queue ownership and socket readiness.
//!
//! The backend owns a single `EventQueue<WaylandState>` created by the
//! registry initialization. Every protocol object is created with its
//! [`QueueHandle`], so all events land in the same queue and are dispatched
//! into the same [`WaylandState`].
//!
//! ```text
//! socket ──► wait(): prepare_read ─► poll(fd, timeout) ─► guard.read()
//!                                                             │
//! dispatch_pending() ◄── EventQueue<WaylandState> ◄───────────┘
//!        │
//!        └──► Dispatch impls push lectern events into WaylandState::events
//! ```
//!
//! Using another queue handle for an object causes silent non-delivery of
//! its events.

use std::io::ErrorKind;

use lectern_core::display::Wake;
use lectern_core::event::Event;
use lectern_core::time::Duration;
use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;
use wayland_client::backend::WaylandError;
use wayland_client::protocol::wl_data_source::WlDataSource;
use wayland_client::protocol::wl_keyboard::WlKeyboard;
use wayland_client::protocol::wl_pointer::WlPointer;
use wayland_client::{DispatchError, EventQueue, QueueHandle};

use crate::error::BackendError;
use crate::keymap::Keyboard;
use crate::time::duration_to_timespec;

/// Physical description of the output, from `wl_output` geometry and mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OutputInfo {
    /// Current mode width in pixels.
    pub(crate) width: i32,
    /// Physical width in millimeters.
    pub(crate) physical_width_mm: i32,
}

impl OutputInfo {
    /// Horizontal resolution in dots per inch, rounded and clamped to
    /// `36..=1200`. `None` when the compositor reports no physical size.
    pub(crate) fn resolution(self) -> Option<u32> {
        if self.width <= 0 || self.physical_width_mm <= 0 {
            return None;
        }
        let width = i64::from(self.width);
        let mm = i64::from(self.physical_width_mm);
        let dpi = (width * 254 + mm * 5) / (mm * 10);
        u32::try_from(dpi.clamp(36, 1200)).ok()
    }
}

/// Protocol-side state mutated by the `Dispatch` impls.
#[derive(Debug, Default)]
pub(crate) struct WaylandState {
    /// Translated events waiting for the run loop.
    pub(crate) events: Vec<Event>,
    /// The first `xdg_surface.configure` has been acknowledged.
    pub(crate) configured: bool,
    pub(crate) keys: Keyboard,
    pub(crate) pointer: (i32, i32),
    /// Serial of the most recent key or button press, used for selection.
    pub(crate) serial: u32,
    pub(crate) keyboard: Option<WlKeyboard>,
    pub(crate) pointer_device: Option<WlPointer>,
    /// Text offered while we own the clipboard.
    pub(crate) selection: Option<String>,
    pub(crate) source: Option<WlDataSource>,
    pub(crate) output: OutputInfo,
}

impl WaylandState {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// The backend-owned queue together with the state it dispatches into.
#[derive(Debug)]
pub(crate) struct OwnedQueueMode {
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
}

impl OwnedQueueMode {
    pub(crate) fn new(event_queue: EventQueue<WaylandState>, state: WaylandState) -> Self {
        Self { event_queue, state }
    }

    /// Returns the queue handle all backend objects must be created with.
    pub(crate) fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.event_queue.handle()
    }

    /// Dispatches already-read events without blocking or touching the
    /// socket.
    pub(crate) fn dispatch_pending(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.dispatch_pending(&mut self.state)
    }

    /// Flushes, blocks for new events when needed, and dispatches.
    pub(crate) fn blocking_dispatch(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.blocking_dispatch(&mut self.state)
    }

    /// Waits until the server has processed every request sent so far.
    pub(crate) fn roundtrip(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.roundtrip(&mut self.state)
    }

    pub(crate) fn flush(&self) -> Result<(), WaylandError> {
        self.event_queue.flush()
    }

    /// Blocks until the socket has data, `timeout` elapses, or a signal
    /// arrives. Readable data is read into the queue before returning.
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> Result<Wake, BackendError> {
        let Some(guard) = self.event_queue.prepare_read() else {
            return Ok(Wake::Readable);
        };
        let timeout = timeout.map(duration_to_timespec);
        let ready = {
            let fd = guard.connection_fd();
            let mut fds = [PollFd::new(&fd, PollFlags::IN)];
            match poll(&mut fds, timeout.as_ref()) {
                Ok(ready) => ready,
                Err(errno) if errno == Errno::INTR => return Ok(Wake::Interrupted),
                Err(errno) => return Err(BackendError::Poll(errno.into())),
            }
        };
        if ready == 0 {
            return Ok(Wake::TimedOut);
        }
        match guard.read() {
            Ok(_) => {}
            Err(WaylandError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(err.into()),
        }
        Ok(Wake::Readable)
    }

    pub(crate) fn state(&self) -> &WaylandState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut WaylandState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::OutputInfo;

    #[test]
    fn resolution_rounds_to_nearest() {
        let output = OutputInfo {
            width: 1920,
            physical_width_mm: 508,
        };
        assert_eq!(output.resolution(), Some(96));
    }

    #[test]
    fn resolution_is_clamped() {
        let tiny = OutputInfo {
            width: 100,
            physical_width_mm: 1000,
        };
        let dense = OutputInfo {
            width: 8000,
            physical_width_mm: 100,
        };
        assert_eq!(tiny.resolution(), Some(36));
        assert_eq!(dense.resolution(), Some(1200));
    }

    #[test]
    fn unknown_physical_size_has_no_resolution() {
        let output = OutputInfo {
            width: 1920,
            physical_width_mm: 0,
        };
        assert_eq!(output.resolution(), None);
        assert_eq!(OutputInfo::default().resolution(), None);
    }
}
