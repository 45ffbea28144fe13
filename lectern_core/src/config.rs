// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Run-loop configuration.

use crate::time::Duration;

/// Tunables for the run loop and the services it offers the viewer.
///
/// The defaults reproduce a classic desktop viewer window: 800x600 with a
/// 30 pixel status bar, warnings shown for ten seconds and the page indicator
/// for two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoopConfig {
    /// How long [`Context::warn`](crate::context::Context::warn) keeps a
    /// warning on screen.
    pub warning_duration: Duration,
    /// How long the page-number indicator stays up after `P`.
    pub page_indicator_duration: Duration,
    /// Window width before the first configure.
    pub initial_width: u32,
    /// Window height before the first configure.
    pub initial_height: u32,
    /// Height of the status bar at the bottom of the canvas, in pixels.
    pub status_bar_height: u32,
}

impl LoopConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warning_duration: Duration::from_secs(10),
            page_indicator_duration: Duration::from_secs(2),
            initial_width: 800,
            initial_height: 600,
            status_bar_height: 30,
        }
    }

    /// Replaces the warning duration.
    #[must_use]
    pub const fn with_warning_duration(mut self, duration: Duration) -> Self {
        self.warning_duration = duration;
        self
    }

    /// Replaces the page indicator duration.
    #[must_use]
    pub const fn with_page_indicator_duration(mut self, duration: Duration) -> Self {
        self.page_indicator_duration = duration;
        self
    }

    /// Replaces the initial window size.
    #[must_use]
    pub const fn with_initial_size(mut self, width: u32, height: u32) -> Self {
        self.initial_width = width;
        self.initial_height = height;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_desktop_window() {
        let config = LoopConfig::default();
        assert_eq!(config.warning_duration, Duration::from_secs(10));
        assert_eq!(config.page_indicator_duration, Duration::from_secs(2));
        assert_eq!((config.initial_width, config.initial_height), (800, 600));
        assert_eq!(config.status_bar_height, 30);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = LoopConfig::new()
            .with_warning_duration(Duration::from_secs(3))
            .with_initial_size(640, 480);
        assert_eq!(config.warning_duration, Duration::from_secs(3));
        assert_eq!(config.initial_width, 640);
        assert_eq!(config.page_indicator_duration, Duration::from_secs(2));
    }
}
