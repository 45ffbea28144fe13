// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The single-threaded redraw and timer loop.
//!
//! [`RunLoop`] multiplexes three things into one blocking wait on the
//! display connection: the frame acknowledgment handshake, the message
//! deadline, and the auto-advance deadline. Each [`RunLoop::iterate`] call
//! performs one pass:
//!
//! ```text
//!  1. drain queued events ─► dispatch each (input, resize, ack, close, reload)
//!  2. closing? ─► Closed
//!  3. size changed or no canvas? ─► reallocate canvas + surface
//!  4. dirty and gate open? ─► render, submit, clear dirty
//!  5. deadline already expired? ─► fire it, end the pass without blocking
//!  6. send queued requests, flush
//!  7. wait(min remaining deadline | forever)
//!  8. Readable ─► drain + dispatch
//!     TimedOut ─► fire deadlines that have truly passed
//!     Interrupted ─► nothing; the next drain sees signal-derived events
//! ```
//!
//! Dirty flags that cannot be submitted because a frame is in flight stay set
//! until the acknowledgment arrives, so server back-pressure throttles the
//! repaint rate.

use alloc::vec::Vec;

use crate::canvas::Canvas;
use crate::config::LoopConfig;
use crate::context::{Context, Request};
use crate::display::{Display, Wake};
use crate::event::{Event, Modifiers};
use crate::gate::{FrameGate, GateBusy};
use crate::scheduler::TimerKind;
use crate::time::HostTime;
use crate::trace::{
    DeferEvent, FrameAckEvent, ResizeEvent, SubmitEvent, TimerFiredEvent, Tracer, WaitEvent,
    WakeEvent,
};
use crate::viewer::Viewer;

/// Where the loop is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// No deadline armed and no frame in flight.
    Idle,
    /// Something is pending: an armed deadline or an unacknowledged frame.
    Waiting,
    /// Processing events or expired deadlines.
    Dispatching,
    /// Terminal. No further dispatch happens.
    Closed,
}

/// A fatal error that stopped the loop.
#[derive(Debug, thiserror::Error)]
pub enum RunError<D, R> {
    /// The display connection failed.
    #[error("display connection failed")]
    Display(#[source] D),
    /// The viewer failed to draw a frame.
    #[error("rendering failed")]
    Render(#[source] R),
}

/// The [`RunError`] for a given display and viewer.
pub type LoopError<D, V> = RunError<<D as Display>::Error, <V as Viewer>::Error>;

/// Drives a [`Viewer`] on a [`Display`].
#[derive(Debug)]
pub struct RunLoop<D, V> {
    display: D,
    viewer: V,
    cx: Context,
    gate: FrameGate,
    canvas: Option<Canvas>,
    state: LoopState,
    events: Vec<Event>,
    reallocations: u64,
}

impl<D: Display, V: Viewer> RunLoop<D, V> {
    /// Creates a loop. Nothing touches the display until the first
    /// iteration.
    #[must_use]
    pub fn new(display: D, viewer: V, config: LoopConfig) -> Self {
        let mut cx = Context::new(config);
        cx.set_now(display.now());
        Self {
            display,
            viewer,
            cx,
            gate: FrameGate::new(),
            canvas: None,
            state: LoopState::Idle,
            events: Vec::new(),
            reallocations: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// The shared viewer context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.cx
    }

    /// The shared viewer context, mutably. Use this to arm deadlines or show
    /// a message before the first iteration.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.cx
    }

    /// The viewer.
    #[must_use]
    pub const fn viewer(&self) -> &V {
        &self.viewer
    }

    /// The viewer and the context together, for setup that needs both.
    pub fn viewer_and_context_mut(&mut self) -> (&mut V, &mut Context) {
        (&mut self.viewer, &mut self.cx)
    }

    /// The display.
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// The frame gate.
    #[must_use]
    pub const fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// The backing canvas, once allocated.
    #[must_use]
    pub const fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// How many times the canvas has been (re)allocated.
    #[must_use]
    pub const fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Iterates until the loop closes or a fatal error occurs.
    pub fn run(&mut self, tracer: &mut Tracer<'_>) -> Result<(), LoopError<D, V>> {
        while self.iterate(tracer)? != LoopState::Closed {}
        Ok(())
    }

    /// Performs one pass of the loop and returns the resulting state.
    pub fn iterate(&mut self, tracer: &mut Tracer<'_>) -> Result<LoopState, LoopError<D, V>> {
        if self.state == LoopState::Closed {
            return Ok(LoopState::Closed);
        }

        self.state = LoopState::Dispatching;
        self.drain(tracer)?;
        if self.cx.is_closing() {
            return Ok(self.close());
        }

        self.reallocate_if_needed(tracer)?;
        self.repaint(tracer)?;

        // Deadlines that passed while dispatching fire now; blocking first
        // would delay their repaint by a full wait.
        let now = self.display.now();
        if self.fire_timers(now, tracer) {
            return Ok(self.settle());
        }
        let timeout = self.cx.timers().next_wait(now).timeout();

        self.send_requests();
        self.display.flush().map_err(RunError::Display)?;

        tracer.wait(&WaitEvent { at: now, timeout });
        self.state = LoopState::Waiting;
        let wake = self.display.wait(timeout).map_err(RunError::Display)?;
        let at = self.display.now();
        tracer.wake(&WakeEvent { at, wake });

        self.state = LoopState::Dispatching;
        match wake {
            Wake::Readable => self.drain(tracer)?,
            Wake::TimedOut => {
                self.fire_timers(at, tracer);
            }
            Wake::Interrupted => log::debug!("wait interrupted by a signal"),
        }
        Ok(self.settle())
    }

    fn settle(&mut self) -> LoopState {
        if self.cx.is_closing() {
            return self.close();
        }
        self.state = if self.cx.timers().is_idle() && !self.gate.is_pending() {
            LoopState::Idle
        } else {
            LoopState::Waiting
        };
        self.state
    }

    fn close(&mut self) -> LoopState {
        if self.state != LoopState::Closed {
            log::debug!("run loop closed");
        }
        self.state = LoopState::Closed;
        self.state
    }

    // -- dispatch ----------------------------------------------------------

    fn drain(&mut self, tracer: &mut Tracer<'_>) -> Result<(), LoopError<D, V>> {
        let mut events = core::mem::take(&mut self.events);
        self.display
            .dispatch_pending(&mut events)
            .map_err(RunError::Display)?;
        if !events.is_empty() {
            self.cx.set_now(self.display.now());
        }
        for event in events.drain(..) {
            if self.cx.is_closing() {
                break;
            }
            self.dispatch_event(event, tracer);
        }
        self.events = events;
        Ok(())
    }

    fn dispatch_event(&mut self, event: Event, tracer: &mut Tracer<'_>) {
        if event.is_user_press() && self.cx.cancel_advance() {
            log::debug!("auto-advance cancelled by input");
        }
        match event {
            Event::Key { code, modifiers } => {
                self.clear_copied();
                self.dispatch_key(code, modifiers);
            }
            Event::NavKey {
                key,
                text,
                modifiers,
            } => {
                self.clear_copied();
                let code = if self.viewer.is_searching() {
                    text
                } else {
                    Some(key.command())
                };
                if let Some(code) = code {
                    self.dispatch_key(code, modifiers);
                }
            }
            Event::PointerMotion { x, y } => {
                self.cx.set_pointer(x, y);
                self.viewer
                    .handle_pointer(&mut self.cx, x, y, None, Modifiers::NONE, false);
            }
            Event::PointerButton {
                x,
                y,
                button,
                pressed,
                modifiers,
            } => {
                self.cx.set_pointer(x, y);
                self.clear_copied();
                self.viewer
                    .handle_pointer(&mut self.cx, x, y, Some(button), modifiers, pressed);
            }
            Event::Resize {
                width,
                height,
                maximized,
            } => self.cx.configure(width, height, maximized),
            Event::FrameAck => {
                let id = self.gate.acknowledge();
                if id.is_none() {
                    log::debug!("ignoring frame acknowledgment with nothing in flight");
                }
                tracer.frame_ack(&FrameAckEvent {
                    at: self.cx.now(),
                    id,
                });
            }
            Event::Close => self.cx.close(),
            Event::Reload => self.viewer.reload(&mut self.cx),
        }
    }

    fn dispatch_key(&mut self, code: char, modifiers: Modifiers) {
        if code == 'P' && !self.viewer.is_searching() {
            self.cx.show_page_number();
        } else if modifiers.ctrl && matches!(code, 'c' | 'C') {
            match self.viewer.copy_selection(&self.cx) {
                Some(text) => self.cx.mark_copied(text),
                None => log::debug!("copy requested with empty selection"),
            }
        } else {
            self.viewer.handle_key(&mut self.cx, code, modifiers);
            if self.viewer.is_searching() {
                self.cx.hide_status();
            }
        }
    }

    fn clear_copied(&mut self) {
        if self.cx.take_just_copied() {
            self.cx.request_repaint();
        }
    }

    fn send_requests(&mut self) {
        for request in self.cx.take_requests() {
            let (what, result) = match request {
                Request::SetTitle(title) => ("title", self.display.set_title(&title)),
                Request::SetSelection(text) => ("selection", self.display.set_selection(text)),
                Request::Fullscreen => ("fullscreen", self.display.set_fullscreen()),
            };
            if let Err(err) = result {
                log::warn!("{what} request failed: {err}");
            }
        }
    }

    // -- surface -----------------------------------------------------------

    fn reallocate_if_needed(&mut self, tracer: &mut Tracer<'_>) -> Result<(), LoopError<D, V>> {
        let (width, height) = self.cx.wanted_size();
        let unchanged = self
            .canvas
            .as_ref()
            .is_some_and(|c| c.width() == width && c.height() == height);
        if unchanged {
            return Ok(());
        }

        self.display
            .resize_surface(width, height)
            .map_err(RunError::Display)?;
        self.canvas = Some(Canvas::new(width, height));
        self.reallocations += 1;

        let at = self.display.now();
        self.cx.set_now(at);
        self.viewer.resize(&mut self.cx, width, height);
        self.cx.request_repaint();
        log::debug!("canvas reallocated at {width}x{height}");
        tracer.resize(&ResizeEvent { at, width, height });
        Ok(())
    }

    fn repaint(&mut self, tracer: &mut Tracer<'_>) -> Result<(), LoopError<D, V>> {
        if !self.cx.is_dirty() {
            return Ok(());
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(());
        };
        let at = self.display.now();
        let id = match self.gate.try_submit() {
            Ok(id) => id,
            Err(GateBusy { pending }) => {
                log::trace!("repaint deferred until {pending:?} is acknowledged");
                tracer.defer(&DeferEvent { at, pending });
                return Ok(());
            }
        };

        let full = self.cx.needs_full_repaint();
        if full {
            self.viewer
                .render(&self.cx, canvas)
                .map_err(RunError::Render)?;
        } else {
            self.viewer
                .render_status_bar(&self.cx, canvas)
                .map_err(RunError::Render)?;
        }
        self.display
            .submit_frame(canvas)
            .map_err(RunError::Display)?;
        self.cx.clear_dirty();
        tracer.submit(&SubmitEvent { at, id, full });

        self.cx.set_now(at);
        self.viewer.post_blit(&mut self.cx);
        Ok(())
    }

    // -- timers ------------------------------------------------------------

    /// Fires expired deadlines in expiry order. Returns `true` if any fired.
    fn fire_timers(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> bool {
        let message_at = self.cx.timers().message().expiry();
        let advance_at = self.cx.timers().advance().expiry();
        let fired = self.cx.timers_mut().fire_expired(now);
        if !fired.any() {
            return false;
        }

        self.cx.set_now(now);
        let advance_first = match (message_at, advance_at) {
            (Some(m), Some(a)) => a < m,
            _ => true,
        };
        let order = if advance_first {
            [TimerKind::Advance, TimerKind::Message]
        } else {
            [TimerKind::Message, TimerKind::Advance]
        };
        for kind in order {
            let hit = match kind {
                TimerKind::Message => fired.message,
                TimerKind::Advance => fired.advance,
            };
            if hit {
                self.on_timer(kind);
                tracer.timer_fired(&TimerFiredEvent { at: now, kind });
            }
        }
        true
    }

    fn on_timer(&mut self, kind: TimerKind) {
        log::debug!("{kind:?} deadline fired");
        match kind {
            TimerKind::Message => {
                // An advance handler that ran first may have shown a fresh
                // message; keep it.
                if !self.cx.timers().message().is_armed() {
                    self.cx.clear_message();
                }
                self.viewer.message_timer_elapsed(&mut self.cx);
            }
            TimerKind::Advance => {
                // A page turn counts as a key press for the copy highlight.
                self.clear_copied();
                self.viewer.advance_timer_elapsed(&mut self.cx);
            }
        }
    }
}
