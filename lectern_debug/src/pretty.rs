// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds relative to the first event seen.

use std::io::Write;

use lectern_core::display::Wake;
use lectern_core::scheduler::TimerKind;
use lectern_core::time::{Duration, HostTime};
use lectern_core::trace::{
    DeferEvent, FrameAckEvent, ResizeEvent, SubmitEvent, TimerFiredEvent, TraceSink, WaitEvent,
    WakeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    origin: Option<HostTime>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            origin: None,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            origin: None,
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ms(&mut self, t: HostTime) -> f64 {
        let origin = *self.origin.get_or_insert(t);
        t.saturating_duration_since(origin).as_secs_f64() * 1000.0
    }
}

fn wake_name(wake: Wake) -> &'static str {
    match wake {
        Wake::Readable => "readable",
        Wake::TimedOut => "timeout",
        Wake::Interrupted => "interrupted",
    }
}

fn timer_name(kind: TimerKind) -> &'static str {
    match kind {
        TimerKind::Message => "message",
        TimerKind::Advance => "advance",
    }
}

fn timeout_ms(timeout: Option<Duration>) -> String {
    match timeout {
        Some(d) => format!("{:.1}ms", d.as_secs_f64() * 1000.0),
        None => "forever".to_owned(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_wait(&mut self, e: &WaitEvent) {
        let at = self.ms(e.at);
        let _ = writeln!(
            self.writer,
            "[wait] at={at:.1}ms timeout={}",
            timeout_ms(e.timeout),
        );
    }

    fn on_wake(&mut self, e: &WakeEvent) {
        let at = self.ms(e.at);
        let _ = writeln!(self.writer, "[wake] at={at:.1}ms {}", wake_name(e.wake));
    }

    fn on_timer_fired(&mut self, e: &TimerFiredEvent) {
        let at = self.ms(e.at);
        let _ = writeln!(self.writer, "[timer] at={at:.1}ms {}", timer_name(e.kind));
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        let at = self.ms(e.at);
        let what = if e.full { "full" } else { "status" };
        let _ = writeln!(self.writer, "[submit] frame={} at={at:.1}ms {what}", e.id.0);
    }

    fn on_defer(&mut self, e: &DeferEvent) {
        let at = self.ms(e.at);
        let _ = writeln!(
            self.writer,
            "[defer] at={at:.1}ms waiting for frame={}",
            e.pending.0,
        );
    }

    fn on_frame_ack(&mut self, e: &FrameAckEvent) {
        let at = self.ms(e.at);
        let _ = match e.id {
            Some(id) => writeln!(self.writer, "[ack] frame={} at={at:.1}ms", id.0),
            None => writeln!(self.writer, "[ack] stray at={at:.1}ms"),
        };
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        let at = self.ms(e.at);
        let _ = writeln!(
            self.writer,
            "[resize] at={at:.1}ms {}x{}",
            e.width, e.height,
        );
    }
}
