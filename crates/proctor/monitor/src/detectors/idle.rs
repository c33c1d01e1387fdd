/// Tracks the last user interaction and flags prolonged inactivity.
#[derive(Debug)]
pub struct IdleMonitor {
    timeout_ms: u64,
    last_activity_ms: u64,
}

impl IdleMonitor {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_activity_ms: 0,
        }
    }

    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    pub fn idle_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    pub fn is_idle(&self, now_ms: u64) -> bool {
        self.idle_for(now_ms) >= self.timeout_ms
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_after_timeout() {
        let mut idle = IdleMonitor::new(60_000);
        idle.record_activity(1_000);
        assert!(!idle.is_idle(60_999));
        assert!(idle.is_idle(61_000));
        idle.record_activity(61_500);
        assert!(!idle.is_idle(62_000));
        assert_eq!(idle.idle_for(62_000), 500);
    }
}
