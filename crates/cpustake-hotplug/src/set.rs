//! The full set of managed cores.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use cpustake_core::CoreId;
use tracing::{debug, info, warn};

use crate::controller::CoreController;
use crate::error::HotplugResult;

/// One controller per managed core, iterated in ascending id order.
#[derive(Debug, Default)]
pub struct ControllerSet {
    controllers: BTreeMap<CoreId, CoreController>,
}

impl ControllerSet {
    pub fn new(topology_root: &Path, cores: &BTreeSet<CoreId>, timeout: Option<Duration>) -> Self {
        let controllers = cores
            .iter()
            .map(|&id| {
                (
                    id,
                    CoreController::new(topology_root, id).with_timeout(timeout),
                )
            })
            .collect();
        Self { controllers }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Managed core ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.controllers.keys().copied()
    }

    pub fn get(&self, id: CoreId) -> Option<&CoreController> {
        self.controllers.get(&id)
    }

    /// Number of cores currently online on disk. Core 0 counts as online.
    pub fn active_count(&self) -> HotplugResult<usize> {
        let mut active = 0;
        for ctl in self.controllers.values() {
            if ctl.read_state()?.is_online() {
                active += 1;
            }
        }
        Ok(active)
    }

    /// Issue a request for every `(core, active)` pair, in the order given.
    /// Cores not managed by this set are skipped.
    ///
    /// Returns the number of writes dispatched. Call [`barrier`](Self::barrier)
    /// before reading state again.
    pub async fn request_all(
        &mut self,
        plan: impl IntoIterator<Item = (CoreId, bool)>,
    ) -> HotplugResult<usize> {
        let mut dispatched = 0;
        for (id, active) in plan {
            let Some(ctl) = self.controllers.get_mut(&id) else {
                debug!(core = %id, "plan names an unmanaged core, skipping");
                continue;
            };
            if ctl.request_state(active).await? {
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }

    /// Wait for every controller's pending write.
    ///
    /// Every controller is awaited even after a failure so that no write is
    /// left in flight; the first error is returned.
    pub async fn barrier(&mut self) -> HotplugResult<()> {
        let mut first_err = None;
        for ctl in self.controllers.values_mut() {
            if let Err(e) = ctl.await_completion().await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Bring every managed core online and wait until all writes finish.
    ///
    /// A core that fails does not stop the others from being requested;
    /// the first error is returned once every write has drained.
    pub async fn restore_all(&mut self) -> HotplugResult<usize> {
        let mut dispatched = 0;
        let mut first_err = None;
        for ctl in self.controllers.values_mut() {
            match ctl.request_state(true).await {
                Ok(true) => dispatched += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(core = %ctl.id(), error = %e, "failed to request core online");
                    first_err.get_or_insert(e);
                }
            }
        }

        let drained = self.barrier().await;
        if let Some(e) = first_err {
            return Err(e);
        }
        drained?;
        info!(cores = self.len(), dispatched, "all cores restored online");
        Ok(dispatched)
    }
}
