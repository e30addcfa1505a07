//! Margin strategy.

use cpustake_core::config::DEFAULT_MARGIN;
use cpustake_core::{CoreId, PolicyKind};

use crate::policy::{LoadContext, Policy};

/// Keeps `ceil(r * active + margin)` cores online, counting from core 0.
///
/// Scaling by the currently active count means the target follows load one
/// step at a time: a saturated set grows by one core, an idle one shrinks
/// towards core 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginPolicy {
    margin: f64,
}

impl MarginPolicy {
    pub fn new(margin: f64) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN)
    }
}

impl Policy for MarginPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Margin
    }

    fn desired_active(&self, ratio: f64, load: &LoadContext) -> u32 {
        (ratio * load.active_count as f64 + self.margin).ceil().max(0.0) as u32
    }

    fn wants_online(&self, core: CoreId, desired_active: u32) -> bool {
        core.get() < desired_active
    }
}
