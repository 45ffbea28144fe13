// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the run loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! run loop calls at each decision point: blocking, waking, firing a timer,
//! submitting or deferring a frame, receiving an acknowledgment, resizing.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use crate::display::Wake;
use crate::gate::SubmissionId;
use crate::scheduler::TimerKind;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// The loop is about to block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaitEvent {
    /// When the wait started.
    pub at: HostTime,
    /// The bound passed to the wait; `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

/// The blocking wait returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WakeEvent {
    /// When the wait returned.
    pub at: HostTime,
    /// Why it returned.
    pub wake: Wake,
}

/// A deadline expired and its callback ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerFiredEvent {
    /// Clock reading used for the expiry check.
    pub at: HostTime,
    /// Which deadline.
    pub kind: TimerKind,
}

/// A frame was rendered and handed to the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubmitEvent {
    /// Submission time.
    pub at: HostTime,
    /// Identity of the frame.
    pub id: SubmissionId,
    /// `false` when only the status bar was redrawn.
    pub full: bool,
}

/// A repaint was wanted but a frame is still unacknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeferEvent {
    /// When the repaint was deferred.
    pub at: HostTime,
    /// The frame still in flight.
    pub pending: SubmissionId,
}

/// The server acknowledged a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameAckEvent {
    /// When the acknowledgment was dispatched.
    pub at: HostTime,
    /// The acknowledged frame; `None` for a stray acknowledgment.
    pub id: Option<SubmissionId>,
}

/// The canvas was reallocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResizeEvent {
    /// When the reallocation happened.
    pub at: HostTime,
    /// New width.
    pub width: u32,
    /// New height.
    pub height: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the run loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called right before the blocking wait.
    fn on_wait(&mut self, e: &WaitEvent) {
        _ = e;
    }

    /// Called when the blocking wait returns.
    fn on_wake(&mut self, e: &WakeEvent) {
        _ = e;
    }

    /// Called after a deadline fired.
    fn on_timer_fired(&mut self, e: &TimerFiredEvent) {
        _ = e;
    }

    /// Called when a frame is submitted.
    fn on_submit(&mut self, e: &SubmitEvent) {
        _ = e;
    }

    /// Called when a repaint is held back by the frame gate.
    fn on_defer(&mut self, e: &DeferEvent) {
        _ = e;
    }

    /// Called when a frame acknowledgment is dispatched.
    fn on_frame_ack(&mut self, e: &FrameAckEvent) {
        _ = e;
    }

    /// Called after the canvas is reallocated.
    fn on_resize(&mut self, e: &ResizeEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($self:ident, $method:ident, $e:ident) => {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`WaitEvent`].
    #[inline]
    pub fn wait(&mut self, e: &WaitEvent) {
        emit!(self, on_wait, e);
    }

    /// Emits a [`WakeEvent`].
    #[inline]
    pub fn wake(&mut self, e: &WakeEvent) {
        emit!(self, on_wake, e);
    }

    /// Emits a [`TimerFiredEvent`].
    #[inline]
    pub fn timer_fired(&mut self, e: &TimerFiredEvent) {
        emit!(self, on_timer_fired, e);
    }

    /// Emits a [`SubmitEvent`].
    #[inline]
    pub fn submit(&mut self, e: &SubmitEvent) {
        emit!(self, on_submit, e);
    }

    /// Emits a [`DeferEvent`].
    #[inline]
    pub fn defer(&mut self, e: &DeferEvent) {
        emit!(self, on_defer, e);
    }

    /// Emits a [`FrameAckEvent`].
    #[inline]
    pub fn frame_ack(&mut self, e: &FrameAckEvent) {
        emit!(self, on_frame_ack, e);
    }

    /// Emits a [`ResizeEvent`].
    #[inline]
    pub fn resize(&mut self, e: &ResizeEvent) {
        emit!(self, on_resize, e);
    }
}
