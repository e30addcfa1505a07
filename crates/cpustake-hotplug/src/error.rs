//! Hotplug error types.

use std::path::PathBuf;
use std::time::Duration;

use cpustake_core::CoreId;
use thiserror::Error;

/// Result type alias for hotplug operations.
pub type HotplugResult<T> = Result<T, HotplugError>;

/// Errors raised while discovering or transitioning cores.
#[derive(Debug, Error)]
pub enum HotplugError {
    #[error("topology root {path} is unreadable: {source}")]
    TopologyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no cpu<N> entries found under {0}")]
    NoCores(PathBuf),

    #[error("failed to read {core} state from {path}: {source}")]
    Read {
        core: CoreId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {core} state to {path}: {source}")]
    Write {
        core: CoreId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected contents {value:?} in {core} online file")]
    InvalidState { core: CoreId, value: String },

    #[error("{core} transition task failed: {source}")]
    Task {
        core: CoreId,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("{core} transition did not complete within {timeout:?}")]
    Timeout { core: CoreId, timeout: Duration },
}
