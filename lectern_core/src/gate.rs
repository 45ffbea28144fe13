// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-frame-in-flight throttle between client and display server.
//!
//! The display server acknowledges each committed frame (on Wayland, the
//! `wl_surface.frame` callback fires). Until it does, the client must not
//! commit another one: repaint requests simply stay dirty and are folded into
//! the next frame after the acknowledgment. Back-pressure from the server
//! therefore throttles the repaint rate instead of queueing frames.

/// Identity of one submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionId(pub u64);

/// A submission was attempted while an earlier frame is still unacknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("frame {pending:?} is still awaiting acknowledgment")]
pub struct GateBusy {
    /// The frame currently in flight.
    pub pending: SubmissionId,
}

/// Tracks whether a submitted frame has been acknowledged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameGate {
    in_flight: Option<SubmissionId>,
    submitted: u64,
    acknowledged: u64,
}

impl FrameGate {
    /// Creates an open gate with nothing in flight.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_flight: None,
            submitted: 0,
            acknowledged: 0,
        }
    }

    /// Returns `true` between a submission and its acknowledgment.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The frame currently awaiting acknowledgment, if any.
    #[must_use]
    pub const fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    /// Number of frames submitted through this gate.
    #[must_use]
    pub const fn submitted_count(&self) -> u64 {
        self.submitted
    }

    /// Number of acknowledgments that closed an in-flight frame.
    #[must_use]
    pub const fn acknowledged_count(&self) -> u64 {
        self.acknowledged
    }

    /// Marks a new frame as in flight.
    ///
    /// Fails without changing state if a frame is already pending.
    pub fn try_submit(&mut self) -> Result<SubmissionId, GateBusy> {
        if let Some(pending) = self.in_flight {
            return Err(GateBusy { pending });
        }
        let id = SubmissionId(self.submitted);
        self.submitted += 1;
        self.in_flight = Some(id);
        Ok(id)
    }

    /// Records the server's acknowledgment of the in-flight frame.
    ///
    /// Returns the acknowledged frame, or `None` for a stray acknowledgment
    /// with nothing in flight.
    pub fn acknowledge(&mut self) -> Option<SubmissionId> {
        let id = self.in_flight.take()?;
        self.acknowledged += 1;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submit_without_ack_is_rejected() {
        let mut gate = FrameGate::new();
        let first = gate.try_submit().unwrap();
        assert_eq!(gate.try_submit(), Err(GateBusy { pending: first }));
        assert_eq!(gate.submitted_count(), 1, "only one frame in flight");
    }

    #[test]
    fn ack_reopens_gate() {
        let mut gate = FrameGate::new();
        let first = gate.try_submit().unwrap();
        assert_eq!(gate.acknowledge(), Some(first));
        assert!(!gate.is_pending());

        let second = gate.try_submit().unwrap();
        assert!(second > first);
        assert_eq!(gate.acknowledged_count(), 1);
    }

    #[test]
    fn stray_ack_is_ignored() {
        let mut gate = FrameGate::new();
        assert_eq!(gate.acknowledge(), None);
        assert_eq!(gate.acknowledged_count(), 0);
    }
}
