// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory binary trace recording.
//!
//! Each event becomes one record: a tag byte followed by its fields in
//! little-endian order, with optional values prefixed by a presence byte.
//! [`decode`] walks a recording and [`RecordedEvent::replay`] feeds the
//! events to another [`TraceSink`], so a run captured with `--record` can be
//! printed later.

use lectern_core::display::Wake;
use lectern_core::gate::SubmissionId;
use lectern_core::scheduler::TimerKind;
use lectern_core::time::{Duration, HostTime};
use lectern_core::trace::{
    DeferEvent, FrameAckEvent, ResizeEvent, SubmitEvent, TimerFiredEvent, TraceSink, WaitEvent,
    WakeEvent,
};

const TAG_WAIT: u8 = 1;
const TAG_WAKE: u8 = 2;
const TAG_TIMER_FIRED: u8 = 3;
const TAG_SUBMIT: u8 = 4;
const TAG_DEFER: u8 = 5;
const TAG_FRAME_ACK: u8 = 6;
const TAG_RESIZE: u8 = 7;

/// Appends every trace event to a byte buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Starts an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recording so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The finished recording, ready to be written to a file.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_wait(&mut self, e: &WaitEvent) {
        self.write_u8(TAG_WAIT);
        self.write_u64(e.at.0);
        self.write_option_u64(e.timeout.map(|d| d.0));
    }

    fn on_wake(&mut self, e: &WakeEvent) {
        self.write_u8(TAG_WAKE);
        self.write_u64(e.at.0);
        self.write_u8(match e.wake {
            Wake::Readable => 0,
            Wake::TimedOut => 1,
            Wake::Interrupted => 2,
        });
    }

    fn on_timer_fired(&mut self, e: &TimerFiredEvent) {
        self.write_u8(TAG_TIMER_FIRED);
        self.write_u64(e.at.0);
        self.write_u8(match e.kind {
            TimerKind::Message => 0,
            TimerKind::Advance => 1,
        });
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        self.write_u8(TAG_SUBMIT);
        self.write_u64(e.at.0);
        self.write_u64(e.id.0);
        self.write_u8(u8::from(e.full));
    }

    fn on_defer(&mut self, e: &DeferEvent) {
        self.write_u8(TAG_DEFER);
        self.write_u64(e.at.0);
        self.write_u64(e.pending.0);
    }

    fn on_frame_ack(&mut self, e: &FrameAckEvent) {
        self.write_u8(TAG_FRAME_ACK);
        self.write_u64(e.at.0);
        self.write_option_u64(e.id.map(|id| id.0));
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.write_u8(TAG_RESIZE);
        self.write_u64(e.at.0);
        self.write_u32(e.width);
        self.write_u32(e.height);
    }
}

/// One event read back from a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`WaitEvent`].
    Wait(WaitEvent),
    /// A [`WakeEvent`].
    Wake(WakeEvent),
    /// A [`TimerFiredEvent`].
    TimerFired(TimerFiredEvent),
    /// A [`SubmitEvent`].
    Submit(SubmitEvent),
    /// A [`DeferEvent`].
    Defer(DeferEvent),
    /// A [`FrameAckEvent`].
    FrameAck(FrameAckEvent),
    /// A [`ResizeEvent`].
    Resize(ResizeEvent),
}

impl RecordedEvent {
    /// Replays this event into `sink`.
    pub fn replay(&self, sink: &mut dyn TraceSink) {
        match self {
            Self::Wait(e) => sink.on_wait(e),
            Self::Wake(e) => sink.on_wake(e),
            Self::TimerFired(e) => sink.on_timer_fired(e),
            Self::Submit(e) => sink.on_submit(e),
            Self::Defer(e) => sink.on_defer(e),
            Self::FrameAck(e) => sink.on_frame_ack(e),
            Self::Resize(e) => sink.on_resize(e),
        }
    }
}

/// Reads back the events in `bytes`, as written by [`RecorderSink`].
///
/// Decoding stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Events of a recording, in the order they were recorded.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some((present != 0).then_some(val))
    }

    fn decode_wait(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Wait(WaitEvent {
            at: self.read_time()?,
            timeout: self.read_option_u64()?.map(Duration),
        }))
    }

    fn decode_wake(&mut self) -> Option<RecordedEvent> {
        let at = self.read_time()?;
        let wake = match self.read_u8()? {
            0 => Wake::Readable,
            1 => Wake::TimedOut,
            _ => Wake::Interrupted,
        };
        Some(RecordedEvent::Wake(WakeEvent { at, wake }))
    }

    fn decode_timer_fired(&mut self) -> Option<RecordedEvent> {
        let at = self.read_time()?;
        let kind = match self.read_u8()? {
            0 => TimerKind::Message,
            _ => TimerKind::Advance,
        };
        Some(RecordedEvent::TimerFired(TimerFiredEvent { at, kind }))
    }

    fn decode_submit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Submit(SubmitEvent {
            at: self.read_time()?,
            id: SubmissionId(self.read_u64()?),
            full: self.read_u8()? != 0,
        }))
    }

    fn decode_defer(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Defer(DeferEvent {
            at: self.read_time()?,
            pending: SubmissionId(self.read_u64()?),
        }))
    }

    fn decode_frame_ack(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameAck(FrameAckEvent {
            at: self.read_time()?,
            id: self.read_option_u64()?.map(SubmissionId),
        }))
    }

    fn decode_resize(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Resize(ResizeEvent {
            at: self.read_time()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_WAIT => self.decode_wait(),
            TAG_WAKE => self.decode_wake(),
            TAG_TIMER_FIRED => self.decode_timer_fired(),
            TAG_SUBMIT => self.decode_submit(),
            TAG_DEFER => self.decode_defer(),
            TAG_FRAME_ACK => self.decode_frame_ack(),
            TAG_RESIZE => self.decode_resize(),
            _ => {
                self.pos = self.data.len();
                None
            }
        }
    }
}
