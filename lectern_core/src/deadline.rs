// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot deadlines on the monotonic clock.
//!
//! A [`Deadline`] is either unarmed or armed with an absolute expiry. The
//! expiry only exists while armed, so a stale expiry can never be read.

use crate::time::{Duration, HostTime};

/// Result of checking a [`Deadline`] against the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Not armed.
    Idle,
    /// Armed; fires after the contained remaining time.
    Pending(Duration),
    /// Was armed and has passed; the deadline is now disarmed.
    Expired,
}

/// An armable absolute expiry time driving a single timed callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Deadline {
    expiry: Option<HostTime>,
}

impl Deadline {
    /// Creates an unarmed deadline.
    #[must_use]
    pub const fn new() -> Self {
        Self { expiry: None }
    }

    /// Returns `true` while armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.expiry.is_some()
    }

    /// The absolute expiry, if armed.
    #[must_use]
    pub const fn expiry(&self) -> Option<HostTime> {
        self.expiry
    }

    /// Time left until expiry, if armed. Zero once the expiry has passed.
    #[must_use]
    pub fn remaining(&self, now: HostTime) -> Option<Duration> {
        self.expiry.map(|at| at.saturating_duration_since(now))
    }

    /// Arms unconditionally, replacing any previous expiry.
    pub fn arm(&mut self, duration: Duration, now: HostTime) {
        self.expiry = Some(now.saturating_add(duration));
    }

    /// Arms for at least `min_duration`.
    ///
    /// An already armed deadline is only moved when `min_duration` is
    /// strictly longer than its remaining time; a shorter request never
    /// truncates the current expiry. Returns `true` if the expiry changed.
    pub fn extend(&mut self, min_duration: Duration, now: HostTime) -> bool {
        match self.remaining(now) {
            Some(left) if min_duration <= left => false,
            _ => {
                self.arm(min_duration, now);
                true
            }
        }
    }

    /// Disarms. Returns `true` if the deadline was armed.
    pub fn disarm(&mut self) -> bool {
        self.expiry.take().is_some()
    }

    /// Checks the deadline and disarms it if `expiry <= now`.
    pub fn fire_if_expired(&mut self, now: HostTime) -> Expiry {
        match self.expiry {
            None => Expiry::Idle,
            Some(at) if at <= now => {
                self.expiry = None;
                Expiry::Expired
            }
            Some(at) => Expiry::Pending(at.saturating_duration_since(now)),
        }
    }
}
