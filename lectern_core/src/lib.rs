// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw and timer scheduling for document viewer front-ends.
//!
//! `lectern_core` is the platform-independent half of a viewer window: a
//! single-threaded loop that turns display-server events and two timers into
//! repaints and page turns, while never having more than one frame in
//! flight. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Display (backend) ──events──► RunLoop::iterate()
//!        ▲                           │
//!        │ submit_frame              ├─► Viewer callbacks ──► Context
//!        │ wait(timeout)             │      (repaint, show_message,
//!        │                           │       schedule_advance, ...)
//!        │                           ▼
//!        └──── FrameGate ◄── render if dirty ◄── Timers::next_wait()
//! ```
//!
//! **[`time`]**: `HostTime` / `Duration` nanosecond newtypes with checked and
//! saturating arithmetic.
//!
//! **[`deadline`]**: one-shot armable deadlines.
//!
//! **[`gate`]**: the one-frame-in-flight throttle.
//!
//! **[`scheduler`]**: the message and advance deadlines and the wait bound
//! computed from them.
//!
//! **[`event`]**: the closed set of events a backend delivers.
//!
//! **[`context`]**: state shared with the viewer, and the services it can
//! call.
//!
//! **[`viewer`]** and **[`display`]**: the two collaborator contracts.
//!
//! **[`run_loop`]**: the loop itself.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! loop instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod canvas;
pub mod config;
pub mod context;
pub mod deadline;
pub mod display;
pub mod event;
pub mod gate;
pub mod run_loop;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod viewer;

#[cfg(test)]
mod testing;
