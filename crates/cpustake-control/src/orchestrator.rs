//! Orchestrator — owns the history, the controllers, and the policy, and
//! drives them tick by tick.

use std::time::Duration;

use cpustake_core::{CoreId, StakeConfig};
use cpustake_hotplug::{ControllerSet, discover_cores};
use cpustake_policy::{LoadContext, Policy, build_policy};
use cpustake_sampler::{SampleOutcome, UsageHistory, UsageSampler};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ControlResult;

/// Lifecycle of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// `None` when the counters could not be read.
    pub outcome: Option<SampleOutcome>,
    /// Set when a ratio was produced and a plan applied.
    pub desired_active: Option<u32>,
    /// Writes dispatched (and completed) during the tick.
    pub dispatched: usize,
}

impl TickReport {
    fn skipped(outcome: Option<SampleOutcome>) -> Self {
        Self {
            outcome,
            desired_active: None,
            dispatched: 0,
        }
    }
}

/// The sample → decide → apply → barrier loop.
pub struct Orchestrator {
    sampler: UsageSampler,
    history: UsageHistory,
    controllers: ControllerSet,
    policy: Box<dyn Policy>,
    source: String,
    interval: Duration,
    state: LoopState,
}

impl Orchestrator {
    pub fn new(
        sampler: UsageSampler,
        controllers: ControllerSet,
        policy: Box<dyn Policy>,
        source: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            sampler,
            history: UsageHistory::new(),
            controllers,
            policy,
            source: source.into(),
            interval,
            state: LoopState::Running,
        }
    }

    /// Discover cores under the configured topology root and assemble the
    /// loop. Fails when the root is unreadable or holds no cores.
    pub fn from_config(config: &StakeConfig) -> ControlResult<Self> {
        let cores = discover_cores(&config.topology_root)?;
        info!(
            count = cores.len(),
            cores = ?cores.iter().map(|c| c.get()).collect::<Vec<_>>(),
            "found cores"
        );

        let controllers =
            ControllerSet::new(&config.topology_root, &cores, config.transition_timeout);
        Ok(Self::new(
            UsageSampler::new(&config.stat_path),
            controllers,
            build_policy(config),
            config.source.clone(),
            config.interval,
        ))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn controllers(&self) -> &ControllerSet {
        &self.controllers
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    /// Run one tick: sample, plan and request when a ratio is available,
    /// then wait for every pending write.
    ///
    /// Sampling failures are logged and skip the decision. Device failures
    /// are returned after the barrier has drained all writes.
    pub async fn tick(&mut self) -> ControlResult<TickReport> {
        let outcome = match self.sampler.sample(&mut self.history, &self.source) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, source = %self.source, "usage sample unavailable, skipping tick");
                return Ok(TickReport::skipped(None));
            }
        };

        let Some(ratio) = outcome.ratio() else {
            self.controllers.barrier().await?;
            return Ok(TickReport::skipped(Some(outcome)));
        };

        let applied = self.apply(ratio).await;
        let drained = self.controllers.barrier().await;
        let (desired_active, dispatched) = applied?;
        drained?;

        debug!(ratio, desired_active, dispatched, "tick complete");
        Ok(TickReport {
            outcome: Some(outcome),
            desired_active: Some(desired_active),
            dispatched,
        })
    }

    async fn apply(&mut self, ratio: f64) -> ControlResult<(u32, usize)> {
        let load = LoadContext {
            active_count: self.controllers.active_count()?,
            total_cores: self.controllers.len(),
        };
        let cores: Vec<CoreId> = self.controllers.ids().collect();
        let plan = self.policy.plan(ratio, &load, &cores);
        let dispatched = self.controllers.request_all(plan.assignments).await?;
        Ok((plan.desired_active, dispatched))
    }

    /// Enter `ShuttingDown`: request every core online and wait for all
    /// writes to complete.
    pub async fn shutdown(&mut self) -> ControlResult<()> {
        self.state = LoopState::ShuttingDown;
        info!("re-enabling all cores");
        self.controllers.restore_all().await?;
        Ok(())
    }

    /// Tick every interval until `shutdown` flips to `true` (or its sender
    /// is dropped), then restore every core online.
    ///
    /// A device failure ends the loop; cores are restored on a best-effort
    /// basis and the original error is returned.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> ControlResult<()> {
        info!(
            policy = %self.policy.kind(),
            interval_ms = self.interval.as_millis() as u64,
            cores = self.controllers.len(),
            "control loop started"
        );

        if let Err(e) = self.run_until_signalled(&mut shutdown).await {
            error!(error = %e, "control loop failed, restoring cores");
            self.state = LoopState::ShuttingDown;
            if let Err(restore) = self.controllers.restore_all().await {
                error!(error = %restore, "failed to restore cores");
            }
            return Err(e);
        }

        info!("shutdown signal received");
        self.shutdown().await
    }

    async fn run_until_signalled(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> ControlResult<()> {
        loop {
            if *shutdown.borrow_and_update() {
                return Ok(());
            }

            self.tick().await?;

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
