//! Grace period manager.
//!
//! Keeps at most one countdown per [`GraceChannel`]. Within a channel a repeat
//! start for the same kind is a no-op, and a start for a different kind
//! replaces the running countdown. Different channels count down
//! independently, each with its own duration.

use std::collections::BTreeMap;

use proctor_types::{GraceChannel, ViolationKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scheduler::{Scheduler, TimerHandle, TimerTask};

const TICK_MS: u64 = 1_000;

/// A running countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriod {
    pub kind: ViolationKind,
    pub reason: String,
    /// Extra text for the candidate, e.g. remaining warnings.
    pub notice: Option<String>,
    pub duration_secs: u32,
    pub remaining_secs: u32,
    pub started_at_ms: u64,
    #[serde(skip)]
    timer: Option<TimerHandle>,
}

impl GracePeriod {
    /// Message used when the countdown runs out.
    pub fn expiry_message(&self) -> String {
        format!("{} persisted for {}s.", self.reason, self.duration_secs)
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }
}

/// Result of [`GracePeriodManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceStart {
    /// New countdown on an idle channel.
    Started,
    /// A different kind was counting down on the channel and was replaced.
    Replaced { previous: ViolationKind },
    /// Same kind already counting down; nothing changed.
    AlreadyRunning,
}

impl GraceStart {
    /// Whether a fresh countdown began.
    pub fn opened(&self) -> bool {
        !matches!(self, GraceStart::AlreadyRunning)
    }
}

/// Result of a countdown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraceTick {
    Countdown {
        kind: ViolationKind,
        remaining_secs: u32,
    },
    Expired {
        kind: ViolationKind,
        message: String,
    },
    /// Timer no longer belongs to a live countdown.
    Stale,
}

/// Per-channel grace countdowns.
#[derive(Debug, Default)]
pub struct GracePeriodManager {
    periods: BTreeMap<GraceChannel, GracePeriod>,
}

impl GracePeriodManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown for `kind` unless one for the same kind is already running.
    pub fn start(
        &mut self,
        kind: ViolationKind,
        duration_secs: u32,
        notice: Option<String>,
        scheduler: &mut dyn Scheduler,
    ) -> GraceStart {
        let channel = kind.channel();

        let outcome = match self.periods.get(&channel) {
            Some(existing) if existing.kind == kind => {
                debug!(kind = %kind, remaining_secs = existing.remaining_secs, "Grace period already running");
                return GraceStart::AlreadyRunning;
            }
            Some(existing) => GraceStart::Replaced {
                previous: existing.kind,
            },
            None => GraceStart::Started,
        };

        if let Some(previous) = self.periods.remove(&channel) {
            if let Some(timer) = previous.timer {
                scheduler.cancel(timer);
            }
        }

        let timer = scheduler.schedule(TICK_MS, TimerTask::GraceTick(channel));
        info!(
            kind = %kind,
            duration_secs = duration_secs,
            "Grace period started"
        );
        self.periods.insert(
            channel,
            GracePeriod {
                kind,
                reason: kind.reason().to_string(),
                notice,
                duration_secs,
                remaining_secs: duration_secs,
                started_at_ms: scheduler.now_ms(),
                timer: Some(timer),
            },
        );

        outcome
    }

    /// Cancel the countdown on `channel`. Safe to call when none is running.
    pub fn clear(
        &mut self,
        channel: GraceChannel,
        scheduler: &mut dyn Scheduler,
    ) -> Option<GracePeriod> {
        let mut period = self.periods.remove(&channel)?;
        if let Some(timer) = period.timer.take() {
            scheduler.cancel(timer);
        }
        period.remaining_secs = 0;
        info!(kind = %period.kind, "Grace period cleared");
        Some(period)
    }

    /// Cancel every countdown.
    pub fn clear_all(&mut self, scheduler: &mut dyn Scheduler) -> usize {
        let channels: Vec<_> = self.periods.keys().copied().collect();
        channels
            .into_iter()
            .filter_map(|channel| self.clear(channel, scheduler))
            .count()
    }

    /// Advance the countdown owning `handle` by one second.
    pub fn on_tick(
        &mut self,
        channel: GraceChannel,
        handle: TimerHandle,
        scheduler: &mut dyn Scheduler,
    ) -> GraceTick {
        let Some(period) = self.periods.get_mut(&channel) else {
            return GraceTick::Stale;
        };
        if period.timer != Some(handle) {
            return GraceTick::Stale;
        }

        period.remaining_secs = period.remaining_secs.saturating_sub(1);
        if period.remaining_secs > 0 {
            period.timer = Some(scheduler.schedule(TICK_MS, TimerTask::GraceTick(channel)));
            return GraceTick::Countdown {
                kind: period.kind,
                remaining_secs: period.remaining_secs,
            };
        }

        let expired = self.periods.remove(&channel);
        match expired {
            Some(period) => {
                warn!(kind = %period.kind, duration_secs = period.duration_secs, "Grace period expired");
                GraceTick::Expired {
                    kind: period.kind,
                    message: period.expiry_message(),
                }
            }
            None => GraceTick::Stale,
        }
    }

    /// Replace the candidate-facing notice of a running countdown.
    pub fn update_notice(&mut self, channel: GraceChannel, notice: Option<String>) {
        if let Some(period) = self.periods.get_mut(&channel) {
            period.notice = notice;
        }
    }

    pub fn get(&self, channel: GraceChannel) -> Option<&GracePeriod> {
        self.periods.get(&channel)
    }

    pub fn is_active(&self, channel: GraceChannel) -> bool {
        self.periods.contains_key(&channel)
    }

    /// Whether `kind` itself (not just its channel) is counting down.
    pub fn is_running(&self, kind: ViolationKind) -> bool {
        self.periods
            .get(&kind.channel())
            .map(|p| p.kind == kind)
            .unwrap_or(false)
    }

    /// Remaining seconds on `channel`; zero when idle.
    pub fn remaining(&self, channel: GraceChannel) -> u32 {
        self.periods
            .get(&channel)
            .map(|p| p.remaining_secs)
            .unwrap_or(0)
    }

    /// Highest-precedence running countdown.
    pub fn primary(&self) -> Option<&GracePeriod> {
        self.periods.values().min_by_key(|p| p.kind.precedence())
    }

    pub fn active(&self) -> impl Iterator<Item = &GracePeriod> {
        self.periods.values()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}
