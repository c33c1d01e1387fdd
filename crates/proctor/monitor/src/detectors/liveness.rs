use proctor_types::VideoState;
use serde::{Deserialize, Serialize};

/// Why the camera feed looks tampered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum TamperSignal {
    ZeroWidth,
    Paused,
    Stalled { stalled_ms: u64 },
}

impl std::fmt::Display for TamperSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TamperSignal::ZeroWidth => write!(f, "video has zero width"),
            TamperSignal::Paused => write!(f, "video is paused"),
            TamperSignal::Stalled { stalled_ms } => {
                write!(f, "video has not advanced for {}ms", stalled_ms)
            }
        }
    }
}

/// Camera liveness check, evaluated every tick regardless of face count.
#[derive(Debug)]
pub struct LivenessMonitor {
    window_ms: u64,
    last_position_ms: Option<u64>,
    last_advance_at_ms: u64,
}

impl LivenessMonitor {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_position_ms: None,
            last_advance_at_ms: 0,
        }
    }

    /// Restart the stall window, e.g. when the stream (re)starts.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_position_ms = None;
        self.last_advance_at_ms = now_ms;
    }

    pub fn check(&mut self, video: VideoState, now_ms: u64) -> Option<TamperSignal> {
        if self.last_position_ms != Some(video.position_ms) {
            self.last_position_ms = Some(video.position_ms);
            self.last_advance_at_ms = now_ms;
        }

        if video.width == 0 {
            return Some(TamperSignal::ZeroWidth);
        }
        if video.paused {
            return Some(TamperSignal::Paused);
        }

        let stalled_ms = now_ms.saturating_sub(self.last_advance_at_ms);
        if stalled_ms > self.window_ms {
            return Some(TamperSignal::Stalled { stalled_ms });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(position_ms: u64) -> VideoState {
        VideoState {
            width: 640,
            paused: false,
            position_ms,
        }
    }

    #[test]
    fn advancing_feed_is_live() {
        let mut liveness = LivenessMonitor::new(5_000);
        liveness.reset(0);
        for t in (0..20_000).step_by(100) {
            assert!(liveness.check(playing(t), t).is_none());
        }
    }

    #[test]
    fn frozen_feed_flags_after_window() {
        let mut liveness = LivenessMonitor::new(5_000);
        liveness.reset(0);
        assert!(liveness.check(playing(1_000), 1_000).is_none());
        assert!(liveness.check(playing(1_000), 6_000).is_none());
        assert_eq!(
            liveness.check(playing(1_000), 6_001),
            Some(TamperSignal::Stalled { stalled_ms: 5_001 })
        );
        assert!(liveness.check(playing(1_100), 6_100).is_none());
    }

    #[test]
    fn zero_width_and_paused_flag_immediately() {
        let mut liveness = LivenessMonitor::new(5_000);
        let blank = VideoState {
            width: 0,
            ..playing(10)
        };
        assert_eq!(liveness.check(blank, 10), Some(TamperSignal::ZeroWidth));
        let paused = VideoState {
            paused: true,
            ..playing(20)
        };
        assert_eq!(liveness.check(paused, 20), Some(TamperSignal::Paused));
    }
}
