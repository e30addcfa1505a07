//! The policy seam and plan construction.

use std::fmt;

use cpustake_core::{CoreId, PolicyKind, StakeConfig};
use tracing::debug;

use crate::margin::MarginPolicy;
use crate::scaled::ScaledDelayPolicy;

/// Core counts observed at sampling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadContext {
    /// Cores currently online, core 0 included.
    pub active_count: usize,
    /// All managed cores.
    pub total_cores: usize,
}

/// Desired state for every managed core.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub desired_active: u32,
    /// `(core, online)` in ascending core order.
    pub assignments: Vec<(CoreId, bool)>,
}

impl Plan {
    pub fn online(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.assignments
            .iter()
            .filter(|(_, online)| *online)
            .map(|(id, _)| *id)
    }

    pub fn offline(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.assignments
            .iter()
            .filter(|(_, online)| !*online)
            .map(|(id, _)| *id)
    }
}

/// Maps a utilization ratio to a target core count.
pub trait Policy: Send + Sync + fmt::Debug {
    fn kind(&self) -> PolicyKind;

    /// Number of cores the ratio calls for.
    fn desired_active(&self, ratio: f64, load: &LoadContext) -> u32;

    /// Whether `core` falls inside the desired active range.
    fn wants_online(&self, core: CoreId, desired_active: u32) -> bool;

    /// Plan every core in `cores`. Core 0 is always online.
    fn plan(&self, ratio: f64, load: &LoadContext, cores: &[CoreId]) -> Plan {
        let ratio = sanitize_ratio(ratio);
        let desired_active = self.desired_active(ratio, load);

        let mut assignments: Vec<(CoreId, bool)> = cores
            .iter()
            .map(|&id| (id, id.is_boot() || self.wants_online(id, desired_active)))
            .collect();
        assignments.sort_by_key(|(id, _)| *id);
        assignments.dedup_by_key(|(id, _)| *id);

        debug!(
            policy = %self.kind(),
            ratio,
            active = load.active_count,
            total = load.total_cores,
            desired_active,
            "planned core states"
        );

        Plan {
            desired_active,
            assignments,
        }
    }
}

/// Clamp into `[0, 1]`. A NaN ratio is treated as fully busy so that no
/// core is taken offline on bad input.
fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        1.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// Construct the configured strategy.
pub fn build_policy(config: &StakeConfig) -> Box<dyn Policy> {
    match config.policy {
        PolicyKind::Margin => Box::new(MarginPolicy::new(config.margin)),
        PolicyKind::ScaledDelay => Box::new(ScaledDelayPolicy::new(config.headroom)),
    }
}
