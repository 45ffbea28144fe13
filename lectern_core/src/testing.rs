// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for the run loop: a scripted display on a simulated clock and
//! a viewer that records every callback.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::canvas::Canvas;
use crate::context::Context;
use crate::display::{Display, Wake};
use crate::event::{Button, Event, Modifiers};
use crate::time::{Duration, HostTime};
use crate::viewer::Viewer;

pub(crate) fn ms(millis: u64) -> HostTime {
    HostTime(millis * 1_000_000)
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FakeError {
    #[error("wait with no timeout and nothing scripted would block forever")]
    BlockedForever,
}

/// A display whose clock only moves when the loop waits.
///
/// Events are scripted at absolute times. A wait jumps the clock to the next
/// scripted event if it falls inside the timeout, otherwise to the end of
/// the timeout.
#[derive(Debug, Default)]
pub(crate) struct FakeDisplay {
    clock: HostTime,
    script: VecDeque<(HostTime, Option<Event>)>,
    queued: Vec<Event>,
    auto_ack: Option<Duration>,
    early_by: Option<Duration>,
    pub(crate) frames: Vec<(HostTime, u32, u32)>,
    pub(crate) allocations: Vec<(u32, u32)>,
    pub(crate) waits: Vec<Option<Duration>>,
    pub(crate) wakes: Vec<Wake>,
    pub(crate) titles: Vec<String>,
    pub(crate) selections: Vec<String>,
    pub(crate) fullscreen_requests: usize,
}

impl FakeDisplay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acknowledge every submitted frame after `delay`.
    pub(crate) fn with_auto_ack(mut self, delay: Duration) -> Self {
        self.auto_ack = Some(delay);
        self
    }

    /// Makes the next timed-out wait return `by` before its timeout.
    pub(crate) fn wake_early_once(mut self, by: Duration) -> Self {
        self.early_by = Some(by);
        self
    }

    /// Schedules `event` at `at`, after events already scheduled at the same
    /// time.
    pub(crate) fn push(&mut self, at: HostTime, event: Event) {
        self.insert(at, Some(event));
    }

    /// Schedules a signal that interrupts the wait at `at`.
    pub(crate) fn push_interrupt(&mut self, at: HostTime) {
        self.insert(at, None);
    }

    fn insert(&mut self, at: HostTime, event: Option<Event>) {
        let idx = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(idx, (at, event));
    }

    /// Queues every due event. Due interrupts stay in the script, where
    /// they cut the next wait short.
    fn release_due(&mut self) {
        let mut i = 0;
        while let Some((at, entry)) = self.script.get(i) {
            if *at > self.clock {
                break;
            }
            if entry.is_none() {
                i += 1;
            } else if let Some((_, Some(event))) = self.script.remove(i) {
                self.queued.push(event);
            }
        }
    }
}

impl Display for FakeDisplay {
    type Error = FakeError;

    fn now(&self) -> HostTime {
        self.clock
    }

    fn dispatch_pending(&mut self, events: &mut Vec<Event>) -> Result<(), FakeError> {
        self.release_due();
        events.append(&mut self.queued);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FakeError> {
        Ok(())
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<Wake, FakeError> {
        self.waits.push(timeout);
        let limit = timeout.map(|t| self.clock.saturating_add(t));
        let next = self.script.front().map(|(at, event)| (*at, event.is_some()));
        let wake = match next {
            Some((at, is_event)) if limit.is_none_or(|l| at <= l) => {
                self.clock = self.clock.max(at);
                if is_event {
                    self.release_due();
                    Wake::Readable
                } else {
                    self.script.pop_front();
                    Wake::Interrupted
                }
            }
            _ => match limit {
                Some(l) => {
                    let early = self.early_by.take().unwrap_or(Duration::ZERO);
                    self.clock = self.clock.max(HostTime(l.0.saturating_sub(early.0)));
                    Wake::TimedOut
                }
                None => return Err(FakeError::BlockedForever),
            },
        };
        self.wakes.push(wake);
        Ok(wake)
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), FakeError> {
        self.allocations.push((width, height));
        Ok(())
    }

    fn submit_frame(&mut self, canvas: &Canvas) -> Result<(), FakeError> {
        self.frames
            .push((self.clock, canvas.width(), canvas.height()));
        if let Some(delay) = self.auto_ack {
            let at = self.clock.saturating_add(delay);
            self.push(at, Event::FrameAck);
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), FakeError> {
        self.titles.push(String::from(title));
        Ok(())
    }

    fn set_selection(&mut self, text: String) -> Result<(), FakeError> {
        self.selections.push(text);
        Ok(())
    }

    fn set_fullscreen(&mut self) -> Result<(), FakeError> {
        self.fullscreen_requests += 1;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("render failed")]
pub(crate) struct RenderFailed;

/// Records every callback. Keys request a full repaint; `q` closes, `/`
/// enters search mode, `s` schedules a 3 second advance, `t` sets a title.
#[derive(Debug, Default)]
pub(crate) struct FakeViewer {
    pub(crate) keys: Vec<char>,
    pub(crate) buttons: Vec<(Button, bool)>,
    pub(crate) motions: usize,
    pub(crate) renders: usize,
    pub(crate) status_renders: usize,
    pub(crate) post_blits: usize,
    pub(crate) advances: usize,
    pub(crate) messages_elapsed: usize,
    pub(crate) resizes: Vec<(u32, u32)>,
    pub(crate) reloads: usize,
    pub(crate) searching: bool,
    pub(crate) selection: Option<String>,
    pub(crate) fail_render: bool,
}

impl Viewer for FakeViewer {
    type Error = RenderFailed;

    fn render(&mut self, _cx: &Context, canvas: &mut Canvas) -> Result<(), RenderFailed> {
        if self.fail_render {
            return Err(RenderFailed);
        }
        self.renders += 1;
        canvas.fill(0x00_20_20_20);
        Ok(())
    }

    fn render_status_bar(&mut self, _cx: &Context, _canvas: &mut Canvas) -> Result<(), RenderFailed> {
        if self.fail_render {
            return Err(RenderFailed);
        }
        self.status_renders += 1;
        Ok(())
    }

    fn handle_key(&mut self, cx: &mut Context, code: char, _modifiers: Modifiers) {
        self.keys.push(code);
        match code {
            'q' => cx.close(),
            '/' => self.searching = true,
            's' => cx.schedule_advance(Duration::from_secs(3)),
            't' => cx.set_title("deck"),
            _ => {}
        }
        cx.request_repaint();
    }

    fn handle_pointer(
        &mut self,
        cx: &mut Context,
        _x: i32,
        _y: i32,
        button: Option<Button>,
        _modifiers: Modifiers,
        pressed: bool,
    ) {
        match button {
            Some(button) => {
                self.buttons.push((button, pressed));
                cx.request_repaint();
            }
            None => self.motions += 1,
        }
    }

    fn resize(&mut self, _cx: &mut Context, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn reload(&mut self, cx: &mut Context) {
        self.reloads += 1;
        cx.request_repaint();
    }

    fn copy_selection(&mut self, _cx: &Context) -> Option<String> {
        self.selection.clone()
    }

    fn post_blit(&mut self, _cx: &mut Context) {
        self.post_blits += 1;
    }

    fn is_searching(&self) -> bool {
        self.searching
    }

    fn advance_timer_elapsed(&mut self, cx: &mut Context) {
        self.advances += 1;
        self.handle_key(cx, ' ', Modifiers::NONE);
    }

    fn message_timer_elapsed(&mut self, _cx: &mut Context) {
        self.messages_elapsed += 1;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn due_interrupt_does_not_hold_back_later_events() {
        let mut display = FakeDisplay::new();
        display.push(ms(100), Event::FrameAck);
        display.push_interrupt(ms(100));
        display.push(ms(100), Event::Close);

        let second = Some(Duration::from_secs(1));
        assert_eq!(display.wait(second).unwrap(), Wake::Readable);
        let mut events = Vec::new();
        display.dispatch_pending(&mut events).unwrap();
        assert_eq!(events, vec![Event::FrameAck, Event::Close]);

        assert_eq!(display.wait(second).unwrap(), Wake::Interrupted);
        assert_eq!(display.now(), ms(100), "the interrupt was already due");
    }

    #[test]
    fn early_wake_applies_once() {
        let mut display = FakeDisplay::new().wake_early_once(Duration::from_millis(300));
        let wait = Some(Duration::from_secs(1));
        assert_eq!(display.wait(wait).unwrap(), Wake::TimedOut);
        assert_eq!(display.now(), ms(700));
        assert_eq!(display.wait(wait).unwrap(), Wake::TimedOut);
        assert_eq!(display.now(), ms(1_700));
    }
}
