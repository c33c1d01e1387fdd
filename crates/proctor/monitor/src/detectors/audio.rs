use serde::{Deserialize, Serialize};

/// Microphone level above the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioAnomaly {
    pub level: f64,
    pub threshold: f64,
}

/// Flags loud audio. Informational only; reported once per loud episode.
#[derive(Debug)]
pub struct AudioMonitor {
    threshold: f64,
    loud: bool,
}

impl AudioMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            loud: false,
        }
    }

    pub fn sample(&mut self, level: f64) -> Option<AudioAnomaly> {
        let level = level.clamp(0.0, 1.0);
        if level > self.threshold {
            let onset = !self.loud;
            self.loud = true;
            return onset.then_some(AudioAnomaly {
                level,
                threshold: self.threshold,
            });
        }
        self.loud = false;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_onset_only() {
        let mut audio = AudioMonitor::new(0.3);
        assert!(audio.sample(0.1).is_none());
        assert_eq!(audio.sample(0.6).map(|a| a.level), Some(0.6));
        assert!(audio.sample(0.7).is_none());
        assert!(audio.sample(0.2).is_none());
        assert!(audio.sample(0.9).is_some());
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        let mut audio = AudioMonitor::new(0.3);
        assert_eq!(audio.sample(4.0).map(|a| a.level), Some(1.0));
    }
}
