// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for lectern.
//!
//! [`WaylandDisplay`] implements [`lectern_core::display::Display`] on top of
//! a plain `wayland-client` connection:
//!
//! - One `xdg_toplevel` window, presented from a single `wl_shm` buffer
//! - `wl_surface.frame` callbacks reported as frame acknowledgments
//! - Keyboard and pointer input from the first seat, with keys translated
//!   through the compositor's keymap by xkbcommon
//! - Clipboard offers through `wl_data_device`, when the compositor has one
//! - `SIGHUP` reported as a reload request

mod clipboard;
mod display;
mod error;
mod event_loop;
mod input;
mod keymap;
mod shell;
mod shm;
mod time;

pub use display::WaylandDisplay;
pub use error::BackendError;
pub use time::now;
