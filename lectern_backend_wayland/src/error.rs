// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend error type.

use std::io;

use wayland_client::backend::WaylandError;
use wayland_client::globals::GlobalError;
use wayland_client::{ConnectError, DispatchError};

/// Errors raised by the Wayland display connection.
///
/// Everything except the best-effort requests is fatal to the run loop.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No compositor could be reached (`WAYLAND_DISPLAY` unset or invalid).
    #[error("cannot connect to the Wayland display")]
    Connect(#[from] ConnectError),
    /// The initial registry roundtrip failed.
    #[error("cannot read the Wayland global registry")]
    Registry(#[from] GlobalError),
    /// The compositor does not advertise a required interface.
    #[error("compositor does not provide {0}")]
    MissingGlobal(&'static str),
    /// An event could not be dispatched.
    #[error("Wayland event dispatch failed")]
    Dispatch(#[from] DispatchError),
    /// Reading from or flushing to the socket failed.
    #[error("Wayland connection failed")]
    Connection(#[from] WaylandError),
    /// `poll(2)` on the socket failed.
    #[error("poll on the Wayland socket failed")]
    Poll(#[source] io::Error),
    /// The shared-memory buffer could not be created or written.
    #[error("cannot prepare a {width}x{height} shared-memory buffer")]
    Shm {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The buffer size does not fit the protocol's 32-bit fields.
    #[error("buffer of {width}x{height} pixels is too large")]
    BufferTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The reload signal handler could not be installed.
    #[error("cannot install the SIGHUP handler")]
    Signal(#[source] io::Error),
}
