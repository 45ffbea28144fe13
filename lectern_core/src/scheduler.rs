// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timer merging for the run loop.
//!
//! [`Timers`] owns the two deadlines the front-end multiplexes into its single
//! blocking wait:
//!
//! - the **message** deadline, which dismisses transient status text, and
//! - the **advance** deadline, which turns the page in slideshow mode.
//!
//! Every loop iteration asks [`Timers::next_wait`] for the bound of the
//! blocking wait and, after a timeout wake, calls [`Timers::fire_expired`].
//! Nothing is cached between iterations: dispatch may arm or cancel either
//! deadline as a side effect, so the bound is always recomputed from current
//! state.
//!
//! ```text
//!   arm_message ──┐
//!   arm_advance ──┼──► next_wait(now) ──► Wait::For(min remaining)
//! cancel_advance ─┘                      Wait::Indefinite
//!
//!   wake (timeout) ──► fire_expired(now) ──► Fired { message, advance }
//! ```

use crate::deadline::{Deadline, Expiry};
use crate::time::{Duration, HostTime};

/// Which timer source a deadline belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Transient status message dismissal.
    Message,
    /// Slideshow auto-advance.
    Advance,
}

/// Bound for the next blocking wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wait {
    /// No deadline armed: block until the display connection has work.
    Indefinite,
    /// Wake after at most this long.
    For(Duration),
}

impl Wait {
    /// The timeout to hand to a poll-style primitive; `None` blocks forever.
    #[must_use]
    pub const fn timeout(self) -> Option<Duration> {
        match self {
            Self::Indefinite => None,
            Self::For(d) => Some(d),
        }
    }
}

/// Deadlines that expired in one [`Timers::fire_expired`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Fired {
    /// The message deadline expired.
    pub message: bool,
    /// The advance deadline expired.
    pub advance: bool,
}

impl Fired {
    /// Returns `true` if anything fired.
    #[must_use]
    pub const fn any(self) -> bool {
        self.message || self.advance
    }
}

/// The message and advance deadlines plus the merge logic over them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    message: Deadline,
    advance: Deadline,
}

impl Timers {
    /// Creates a scheduler with both deadlines unarmed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: Deadline::new(),
            advance: Deadline::new(),
        }
    }

    /// The message deadline.
    #[must_use]
    pub const fn message(&self) -> &Deadline {
        &self.message
    }

    /// The advance deadline.
    #[must_use]
    pub const fn advance(&self) -> &Deadline {
        &self.advance
    }

    /// Keeps the status message up for at least `min_duration`.
    ///
    /// Never shortens an armed message deadline; see [`Deadline::extend`].
    pub fn arm_message(&mut self, min_duration: Duration, now: HostTime) -> bool {
        self.message.extend(min_duration, now)
    }

    /// Sets the message deadline to `duration` from now, shortening or
    /// lengthening whatever was armed.
    pub fn set_message(&mut self, duration: Duration, now: HostTime) {
        self.message.arm(duration, now);
    }

    /// Schedules an auto-advance `duration` from now, replacing any pending
    /// one.
    pub fn arm_advance(&mut self, duration: Duration, now: HostTime) {
        self.advance.arm(duration, now);
    }

    /// Cancels a pending auto-advance. Returns `true` if one was armed.
    pub fn cancel_advance(&mut self) -> bool {
        self.advance.disarm()
    }

    /// Returns `true` when neither deadline is armed.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.message.is_armed() && !self.advance.is_armed()
    }

    /// The deadline that expires first, with its remaining time.
    #[must_use]
    pub fn nearest(&self, now: HostTime) -> Option<(TimerKind, Duration)> {
        let message = self.message.remaining(now).map(|d| (TimerKind::Message, d));
        let advance = self.advance.remaining(now).map(|d| (TimerKind::Advance, d));
        match (message, advance) {
            (Some(m), Some(a)) => Some(if a.1 < m.1 { a } else { m }),
            (m, a) => m.or(a),
        }
    }

    /// Computes the bound for the next blocking wait.
    ///
    /// This is the minimum remaining time over the armed deadlines, or
    /// [`Wait::Indefinite`] when none is armed. An expired deadline yields a
    /// zero bound.
    #[must_use]
    pub fn next_wait(&self, now: HostTime) -> Wait {
        match self.nearest(now) {
            Some((_, left)) => Wait::For(left),
            None => Wait::Indefinite,
        }
    }

    /// Disarms and reports every deadline whose expiry is at or before `now`.
    ///
    /// Expiry is re-checked against the clock for each deadline. A wake that
    /// came early, or a timeout computed for one timer while the other is
    /// close behind, fires exactly the deadlines that have truly passed.
    pub fn fire_expired(&mut self, now: HostTime) -> Fired {
        Fired {
            message: self.message.fire_if_expired(now) == Expiry::Expired,
            advance: self.advance.fire_if_expired(now) == Expiry::Expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SEC: u64 = 1_000_000_000;

    fn t(secs: u64) -> HostTime {
        HostTime(secs * SEC)
    }

    #[test]
    fn idle_timers_wait_indefinitely() {
        let timers = Timers::new();
        assert!(timers.is_idle());
        assert_eq!(timers.next_wait(t(0)), Wait::Indefinite);
        assert_eq!(timers.next_wait(t(0)).timeout(), None);
    }

    #[test]
    fn wait_is_min_over_armed_deadlines() {
        let mut timers = Timers::new();
        timers.arm_message(Duration::from_secs(10), t(0));
        assert_eq!(timers.next_wait(t(0)), Wait::For(Duration::from_secs(10)));

        timers.arm_advance(Duration::from_secs(3), t(1));
        assert_eq!(timers.next_wait(t(1)), Wait::For(Duration::from_secs(3)));
        assert_eq!(
            timers.nearest(t(1)),
            Some((TimerKind::Advance, Duration::from_secs(3)))
        );
    }

    #[test]
    fn advance_fires_before_message() {
        // message 10s at t=0, advance 3s at t=1; at t=4 only advance fires.
        let mut timers = Timers::new();
        timers.arm_message(Duration::from_secs(10), t(0));
        timers.arm_advance(Duration::from_secs(3), t(1));

        let fired = timers.fire_expired(t(4));
        assert_eq!(
            fired,
            Fired {
                message: false,
                advance: true
            }
        );
        assert_eq!(
            timers.message().remaining(t(4)),
            Some(Duration::from_secs(6))
        );
        assert!(!timers.advance().is_armed());
    }

    #[test]
    fn early_wake_fires_nothing() {
        let mut timers = Timers::new();
        timers.arm_advance(Duration::from_secs(3), t(0));
        let early = HostTime(3 * SEC - 1);
        assert!(!timers.fire_expired(early).any());
        assert!(timers.advance().is_armed());
    }

    #[test]
    fn close_deadlines_fire_together() {
        let mut timers = Timers::new();
        timers.arm_message(Duration::from_millis(2_000), t(0));
        timers.arm_advance(Duration::from_millis(2_001), t(0));
        let fired = timers.fire_expired(HostTime(2 * SEC + 5_000_000));
        assert!(fired.message && fired.advance, "both have passed");
        assert!(timers.is_idle());
    }

    #[test]
    fn cancel_advance_disarms() {
        let mut timers = Timers::new();
        timers.arm_advance(Duration::from_secs(3), t(0));
        assert!(timers.cancel_advance());
        assert!(!timers.cancel_advance());
        assert_eq!(timers.next_wait(t(0)), Wait::Indefinite);
    }

    #[test]
    fn rearm_advance_replaces_previous() {
        let mut timers = Timers::new();
        timers.arm_advance(Duration::from_secs(10), t(0));
        timers.arm_advance(Duration::from_secs(2), t(1));
        assert_eq!(timers.advance().expiry(), Some(t(3)));
    }

    #[test]
    fn expired_deadline_yields_zero_wait() {
        let mut timers = Timers::new();
        timers.arm_message(Duration::from_secs(1), t(0));
        assert_eq!(timers.next_wait(t(5)), Wait::For(Duration::ZERO));
    }

    #[test]
    fn set_message_can_shorten() {
        let mut timers = Timers::new();
        timers.arm_message(Duration::from_secs(10), t(0));
        timers.set_message(Duration::from_secs(2), t(4));
        assert_eq!(timers.message().expiry(), Some(t(6)));
    }

    proptest! {
        #[test]
        fn wait_is_minimum_remaining(
            message in proptest::option::of(0_u64..10 * SEC),
            advance in proptest::option::of(0_u64..10 * SEC),
            elapsed in 0_u64..12 * SEC,
        ) {
            let start = t(1);
            let now = HostTime(start.0 + elapsed);
            let mut timers = Timers::new();
            if let Some(m) = message {
                timers.arm_message(Duration(m), start);
            }
            if let Some(a) = advance {
                timers.arm_advance(Duration(a), start);
            }

            let left = |armed: Option<u64>| {
                armed.map(|d| Duration((start.0 + d).saturating_sub(now.0)))
            };
            let expected = match (left(message), left(advance)) {
                (Some(m), Some(a)) => Wait::For(m.min(a)),
                (Some(d), None) | (None, Some(d)) => Wait::For(d),
                (None, None) => Wait::Indefinite,
            };
            prop_assert_eq!(timers.next_wait(now), expected);
        }
    }
}
