//! Scaled-delay strategy.

use cpustake_core::config::DEFAULT_HEADROOM;
use cpustake_core::{CoreId, PolicyKind};

use crate::policy::{LoadContext, Policy};

/// Keeps `max(ceil(r * N) + headroom, 1)` as the highest online core id.
///
/// Meant for slow sampling: the headroom absorbs load spikes that happen
/// between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledDelayPolicy {
    headroom: u32,
}

impl ScaledDelayPolicy {
    pub fn new(headroom: u32) -> Self {
        Self { headroom }
    }
}

impl Default for ScaledDelayPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HEADROOM)
    }
}

impl Policy for ScaledDelayPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ScaledDelay
    }

    fn desired_active(&self, ratio: f64, load: &LoadContext) -> u32 {
        let scaled = (ratio * load.total_cores as f64).ceil().max(0.0) as u32;
        scaled.saturating_add(self.headroom).max(1)
    }

    fn wants_online(&self, core: CoreId, desired_active: u32) -> bool {
        core.get() <= desired_active
    }
}
