// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for platform display connections.
//!
//! Lectern splits platform-specific work into *backend* crates. A backend
//! implements [`Display`] on top of a connection to the display server and
//! provides:
//!
//! - **Events**: protocol callbacks translated into [`Event`] values,
//!   delivered in order by [`Display::dispatch_pending`].
//! - **Readiness**: a single blocking [`Display::wait`] on the connection
//!   with an optional timeout. Reading the socket happens inside the wait, so
//!   a [`Wake::Readable`] result means new events are queued.
//! - **Presentation**: [`Display::submit_frame`] attaches the canvas, damages
//!   the surface, requests a frame acknowledgment and commits. The
//!   acknowledgment later arrives as [`Event::FrameAck`].
//! - **Time**: a monotonic [`Display::now`].
//!
//! The best-effort requests (title, selection, fullscreen) default to doing
//! nothing. Their failures are logged by the run loop and otherwise ignored.

use alloc::string::String;
use alloc::vec::Vec;

use crate::canvas::Canvas;
use crate::event::Event;
use crate::time::{Duration, HostTime};

/// Why [`Display::wait`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wake {
    /// The connection has queued events.
    Readable,
    /// The timeout elapsed.
    TimedOut,
    /// A signal interrupted the wait.
    Interrupted,
}

/// A connection to the display server that owns one window.
pub trait Display {
    /// Error for connection-level failures. These stop the loop.
    type Error: core::error::Error + 'static;

    /// Current monotonic time.
    fn now(&self) -> HostTime;

    /// Appends already-queued events to `events` without blocking.
    fn dispatch_pending(&mut self, events: &mut Vec<Event>) -> Result<(), Self::Error>;

    /// Sends buffered requests to the server.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Blocks until the connection is readable or `timeout` elapses.
    /// `None` blocks indefinitely.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<Wake, Self::Error>;

    /// Recreates the backing surface buffer at a new size.
    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), Self::Error>;

    /// Presents `canvas` and requests an acknowledgment.
    fn submit_frame(&mut self, canvas: &Canvas) -> Result<(), Self::Error>;

    /// Sets the window title.
    fn set_title(&mut self, title: &str) -> Result<(), Self::Error> {
        let _ = title;
        Ok(())
    }

    /// Offers `text` as the clipboard selection.
    fn set_selection(&mut self, text: String) -> Result<(), Self::Error> {
        let _ = text;
        Ok(())
    }

    /// Asks for fullscreen.
    fn set_fullscreen(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
