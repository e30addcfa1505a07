//! Per-core online/offline controller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cpustake_core::{CoreId, CoreState};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{HotplugError, HotplugResult};

/// An in-flight write to a core's `online` file.
#[derive(Debug)]
struct PendingTransition {
    target: CoreState,
    handle: JoinHandle<std::io::Result<()>>,
}

/// Owns the online state of one core.
///
/// At most one transition is in flight per controller. A new request first
/// waits for the previous one, then compares against the on-disk state and
/// only writes when they differ. A write that outlives the timeout keeps
/// blocking new requests until it completes.
#[derive(Debug)]
pub struct CoreController {
    id: CoreId,
    path: PathBuf,
    pending: Option<PendingTransition>,
    timeout: Option<Duration>,
}

impl CoreController {
    /// Controller for `<topology_root>/cpu<id>/online`.
    pub fn new(topology_root: &Path, id: CoreId) -> Self {
        Self {
            id,
            path: topology_root.join(format!("cpu{}", id.get())).join("online"),
            pending: None,
            timeout: None,
        }
    }

    /// Bound every wait on a pending write.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> CoreId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a write is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Read the current state from disk. Core 0 is always online and its
    /// file is never read (it usually does not exist).
    pub fn read_state(&self) -> HotplugResult<CoreState> {
        if self.id.is_boot() {
            return Ok(CoreState::Online);
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|err| HotplugError::Read {
            core: self.id,
            path: self.path.clone(),
            source: err,
        })?;
        CoreState::from_sysfs(&raw).ok_or_else(|| HotplugError::InvalidState {
            core: self.id,
            value: raw.trim().to_string(),
        })
    }

    /// Request the core to be online (`active`) or offline.
    ///
    /// Returns `true` when a write was dispatched. Requests for core 0 and
    /// requests matching the current on-disk state dispatch nothing.
    pub async fn request_state(&mut self, active: bool) -> HotplugResult<bool> {
        if self.id.is_boot() {
            return Ok(false);
        }

        self.await_completion().await?;

        let target = CoreState::from_active(active);
        let current = self.read_state()?;
        if current == target {
            return Ok(false);
        }

        debug!(core = %self.id, from = %current, to = %target, "requesting transition");
        let path = self.path.clone();
        let handle = tokio::task::spawn_blocking(move || std::fs::write(path, target.as_sysfs()));
        self.pending = Some(PendingTransition { target, handle });
        Ok(true)
    }

    /// Wait for the outstanding write, if any, and surface its result.
    ///
    /// Once the write has finished the pending marker is cleared, even when
    /// the write failed. On timeout the write is still running: it stays
    /// pending and no new write is issued for this core until it finishes.
    pub async fn await_completion(&mut self) -> HotplugResult<()> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };

        let joined = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut pending.handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(core = %self.id, ?timeout, "core transition still in flight");
                    return Err(HotplugError::Timeout {
                        core: self.id,
                        timeout,
                    });
                }
            },
            None => (&mut pending.handle).await,
        };
        let target = pending.target;
        self.pending = None;

        joined
            .map_err(|err| HotplugError::Task {
                core: self.id,
                source: err,
            })?
            .map_err(|err| HotplugError::Write {
                core: self.id,
                path: self.path.clone(),
                source: err,
            })?;

        info!(core = %self.id, state = %target, "core transitioned");
        Ok(())
    }
}
