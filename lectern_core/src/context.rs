// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewer context: state the run loop shares with the viewer.
//!
//! Every viewer callback receives the [`Context`]. Through it the viewer asks
//! for repaints, shows transient messages, schedules page advances, and
//! queues requests for the display (title, clipboard, fullscreen). The run
//! loop reads the same object to decide what to render, how long to block,
//! and when to stop.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::config::LoopConfig;
use crate::scheduler::Timers;
use crate::time::{Duration, HostTime};

/// What the status bar shows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusLine {
    /// Nothing; the status bar is blank.
    #[default]
    Hidden,
    /// The current page indicator.
    PageNumber,
    /// A transient message.
    Message(String),
}

/// A best-effort request for the display, queued by the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Request {
    /// Set the window title.
    SetTitle(String),
    /// Offer this text as the clipboard selection.
    SetSelection(String),
    /// Ask the window manager for fullscreen.
    Fullscreen,
}

/// Shared state between the run loop and the viewer.
#[derive(Debug)]
pub struct Context {
    config: LoopConfig,
    now: HostTime,
    timers: Timers,
    full_dirty: bool,
    status_dirty: bool,
    status: StatusLine,
    just_copied: bool,
    closing: bool,
    wanted_size: (u32, u32),
    maximized: bool,
    pointer: (i32, i32),
    outbox: Vec<Request>,
}

impl Context {
    /// Creates a context with the initial window size from `config`.
    ///
    /// A full repaint is pending so the first frame is drawn as soon as a
    /// surface exists.
    #[must_use]
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            now: HostTime::default(),
            timers: Timers::new(),
            full_dirty: true,
            status_dirty: false,
            status: StatusLine::Hidden,
            just_copied: false,
            closing: false,
            wanted_size: (config.initial_width, config.initial_height),
            maximized: false,
            pointer: (0, 0),
            outbox: Vec::new(),
        }
    }

    /// The loop configuration.
    #[must_use]
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Clock reading taken by the loop before the current dispatch.
    #[must_use]
    pub const fn now(&self) -> HostTime {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: HostTime) {
        self.now = now;
    }

    /// The timer deadlines.
    #[must_use]
    pub const fn timers(&self) -> &Timers {
        &self.timers
    }

    pub(crate) fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    // -- repaint -----------------------------------------------------------

    /// Requests a full repaint (`repaint_now`).
    pub fn request_repaint(&mut self) {
        self.full_dirty = true;
    }

    /// Requests a repaint of the status bar only (`repaint_status_bar_now`).
    pub fn request_status_repaint(&mut self) {
        self.status_dirty = true;
    }

    /// Returns `true` if anything needs to be drawn.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.full_dirty || self.status_dirty
    }

    /// Returns `true` if the whole canvas needs to be redrawn.
    #[must_use]
    pub const fn needs_full_repaint(&self) -> bool {
        self.full_dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.full_dirty = false;
        self.status_dirty = false;
    }

    // -- status line -------------------------------------------------------

    /// What the status bar currently shows.
    #[must_use]
    pub const fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Height of the status bar in pixels.
    #[must_use]
    pub const fn status_bar_height(&self) -> u32 {
        self.config.status_bar_height
    }

    /// Shows `text` in the status bar for at least `min_duration`.
    ///
    /// A longer message deadline already armed is kept.
    pub fn show_message(&mut self, text: impl Into<String>, min_duration: Duration) {
        self.status = StatusLine::Message(text.into());
        let now = self.now;
        self.timers.arm_message(min_duration, now);
        self.full_dirty = true;
    }

    /// Reports a recoverable problem: logged, and shown as
    /// `warning: <text>` for the configured warning duration.
    pub fn warn(&mut self, text: &str) {
        log::warn!("{text}");
        let mut line = String::from("warning: ");
        line.push_str(text);
        self.show_message(line, self.config.warning_duration);
    }

    /// Shows the page indicator for the configured duration.
    ///
    /// The indicator replaces any message on screen, so its deadline replaces
    /// the message deadline instead of extending it.
    pub fn show_page_number(&mut self) {
        self.status = StatusLine::PageNumber;
        let now = self.now;
        self.timers
            .set_message(self.config.page_indicator_duration, now);
        self.full_dirty = true;
    }

    /// Hides the status line immediately without touching the deadline.
    pub fn hide_status(&mut self) {
        self.status = StatusLine::Hidden;
    }

    pub(crate) fn clear_message(&mut self) {
        self.status = StatusLine::Hidden;
        self.full_dirty = true;
    }

    // -- clipboard ---------------------------------------------------------

    /// Returns `true` right after a copy, until the next key or button event.
    #[must_use]
    pub const fn just_copied(&self) -> bool {
        self.just_copied
    }

    pub(crate) fn mark_copied(&mut self, text: String) {
        self.outbox.push(Request::SetSelection(text));
        self.just_copied = true;
        self.full_dirty = true;
    }

    /// Clears the copy flag; returns `true` if it was set.
    pub(crate) fn take_just_copied(&mut self) -> bool {
        core::mem::take(&mut self.just_copied)
    }

    // -- slideshow ---------------------------------------------------------

    /// Turns the page automatically after `duration`, replacing any pending
    /// advance.
    pub fn schedule_advance(&mut self, duration: Duration) {
        let now = self.now;
        self.timers.arm_advance(duration, now);
    }

    /// Cancels a pending auto-advance.
    pub fn cancel_advance(&mut self) -> bool {
        self.timers.cancel_advance()
    }

    /// Returns `true` while an auto-advance is scheduled.
    #[must_use]
    pub const fn advance_pending(&self) -> bool {
        self.timers.advance().is_armed()
    }

    // -- window ------------------------------------------------------------

    /// The size the canvas should have.
    #[must_use]
    pub const fn wanted_size(&self) -> (u32, u32) {
        self.wanted_size
    }

    /// Returns `true` while the window is maximized or fullscreen.
    #[must_use]
    pub const fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Asks for a new window size. Ignored while maximized or fullscreen,
    /// and for degenerate sizes.
    pub fn request_size(&mut self, width: u32, height: u32) {
        if self.maximized || width == 0 || height == 0 {
            return;
        }
        self.wanted_size = (width, height);
    }

    pub(crate) fn configure(&mut self, width: u32, height: u32, maximized: bool) {
        self.maximized = maximized;
        if width > 0 && height > 0 {
            self.wanted_size = (width, height);
        }
    }

    /// Last known pointer position.
    #[must_use]
    pub const fn pointer(&self) -> (i32, i32) {
        self.pointer
    }

    pub(crate) fn set_pointer(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
    }

    /// Queues a window title update.
    pub fn set_title(&mut self, title: &str) {
        self.outbox.push(Request::SetTitle(title.to_string()));
    }

    /// Queues a fullscreen request.
    pub fn set_fullscreen(&mut self) {
        self.outbox.push(Request::Fullscreen);
    }

    pub(crate) fn take_requests(&mut self) -> Vec<Request> {
        core::mem::take(&mut self.outbox)
    }

    // -- lifecycle ---------------------------------------------------------

    /// Stops the loop after the current dispatch.
    pub fn close(&mut self) {
        self.closing = true;
    }

    /// Returns `true` once a close was requested.
    #[must_use]
    pub const fn is_closing(&self) -> bool {
        self.closing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx_at(secs: u64) -> Context {
        let mut cx = Context::new(LoopConfig::new());
        cx.set_now(HostTime(secs * 1_000_000_000));
        cx
    }

    #[test]
    fn first_frame_is_pending() {
        let cx = Context::new(LoopConfig::new());
        assert!(cx.needs_full_repaint(), "initial frame must be drawn");
        assert_eq!(cx.wanted_size(), (800, 600));
    }

    #[test]
    fn warn_uses_warning_duration() {
        let mut cx = cx_at(1);
        cx.warn("cannot open link");
        assert_eq!(
            cx.status(),
            &StatusLine::Message(String::from("warning: cannot open link"))
        );
        assert_eq!(
            cx.timers().message().remaining(cx.now()),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn page_indicator_replaces_a_warning_deadline() {
        let mut cx = cx_at(0);
        cx.warn("slow");
        cx.set_now(HostTime(4_000_000_000));
        cx.show_page_number();
        assert_eq!(cx.status(), &StatusLine::PageNumber);
        assert_eq!(
            cx.timers().message().expiry(),
            Some(HostTime(6_000_000_000)),
            "2s from the key, not the rest of the 10s warning"
        );
    }

    #[test]
    fn size_request_ignored_while_maximized() {
        let mut cx = cx_at(0);
        cx.configure(1920, 1080, true);
        cx.request_size(640, 480);
        assert_eq!(cx.wanted_size(), (1920, 1080));

        cx.configure(1000, 700, false);
        cx.request_size(640, 480);
        assert_eq!(cx.wanted_size(), (640, 480));
    }

    #[test]
    fn zero_configure_keeps_previous_size() {
        let mut cx = cx_at(0);
        cx.configure(0, 0, false);
        assert_eq!(cx.wanted_size(), (800, 600));
    }

    #[test]
    fn requests_drain_in_order() {
        let mut cx = cx_at(0);
        cx.set_title("deck");
        cx.set_fullscreen();
        assert_eq!(
            cx.take_requests(),
            [Request::SetTitle(String::from("deck")), Request::Fullscreen]
        );
        assert!(cx.take_requests().is_empty(), "outbox is drained");
    }
}
