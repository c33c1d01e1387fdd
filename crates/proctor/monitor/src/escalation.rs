//! Violation escalation policy.
//!
//! Counts repeat offenses per kind against configured budgets and decides
//! whether an occurrence earns another grace period or ends the attempt.
//! Counters only ever grow within a session.

use std::collections::BTreeMap;

use proctor_types::ViolationKind;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EscalationConfig;

/// Occurrence count for one budgeted kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounter {
    pub kind: ViolationKind,
    pub count: u32,
    pub max: u32,
}

impl ViolationCounter {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.count > self.max
    }
}

/// What to do about an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// Within budget: open (or continue) a grace period with this notice.
    Warn {
        counter: ViolationCounter,
        notice: String,
    },
    /// Over budget: force submission without further grace.
    Exhausted {
        counter: ViolationCounter,
        message: String,
    },
}

/// Per-kind counters and budgets.
#[derive(Debug)]
pub struct EscalationPolicy {
    config: EscalationConfig,
    counters: BTreeMap<ViolationKind, ViolationCounter>,
    /// Grace periods opened per unbudgeted kind, tracked only when a cycle limit is set.
    cycles: BTreeMap<ViolationKind, u32>,
}

impl EscalationPolicy {
    pub fn new(config: EscalationConfig) -> Self {
        let counters = ViolationKind::ALL
            .iter()
            .filter_map(|kind| {
                config.max_for(*kind).map(|max| {
                    (
                        *kind,
                        ViolationCounter {
                            kind: *kind,
                            count: 0,
                            max,
                        },
                    )
                })
            })
            .collect();

        Self {
            config,
            counters,
            cycles: BTreeMap::new(),
        }
    }

    /// Record one occurrence of a budgeted kind.
    ///
    /// Returns `None` for kinds without a budget; those are governed by grace
    /// periods alone.
    pub fn record(&mut self, kind: ViolationKind) -> Option<Escalation> {
        let counter = self.counters.get_mut(&kind)?;
        counter.count += 1;
        let counter = *counter;

        if counter.is_exhausted() {
            warn!(
                kind = %kind,
                count = counter.count,
                max = counter.max,
                "Violation budget exhausted"
            );
            return Some(Escalation::Exhausted {
                counter,
                message: format!(
                    "{} limit exceeded: {} occurrences (maximum {}).",
                    kind.label(),
                    counter.count,
                    counter.max
                ),
            });
        }

        info!(
            kind = %kind,
            count = counter.count,
            max = counter.max,
            "Violation recorded"
        );
        Some(Escalation::Warn {
            counter,
            notice: format!(
                "{} of {} warnings remaining.",
                counter.remaining(),
                counter.max
            ),
        })
    }

    /// Record that a grace period opened for an unbudgeted kind.
    ///
    /// Returns the forced-submission message once the configured cycle limit
    /// is passed; always `None` when no limit is configured.
    pub fn record_grace_cycle(&mut self, kind: ViolationKind) -> Option<String> {
        let limit = self.config.anomaly_cycle_limit?;
        if kind.is_budgeted() {
            return None;
        }

        let cycles = self.cycles.entry(kind).or_insert(0);
        *cycles += 1;
        if *cycles > limit {
            warn!(kind = %kind, cycles = *cycles, limit = limit, "Anomaly cycle limit exceeded");
            return Some(format!(
                "{} recurred {} times (maximum {}).",
                kind.label(),
                cycles,
                limit
            ));
        }
        None
    }

    pub fn counter(&self, kind: ViolationKind) -> Option<&ViolationCounter> {
        self.counters.get(&kind)
    }

    pub fn count(&self, kind: ViolationKind) -> u32 {
        self.counters.get(&kind).map(|c| c.count).unwrap_or(0)
    }

    pub fn counters(&self) -> impl Iterator<Item = &ViolationCounter> {
        self.counters.values()
    }

    pub fn grace_cycles(&self, kind: ViolationKind) -> u32 {
        self.cycles.get(&kind).copied().unwrap_or(0)
    }
}
