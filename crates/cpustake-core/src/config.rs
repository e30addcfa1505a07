//! cpustake.toml configuration parser.
//!
//! Settings come in layers: built-in defaults, then an optional TOML file,
//! then command-line flags. Each layer is a [`ConfigOverrides`] with every
//! field optional; [`StakeConfig::resolve`] folds them into the concrete
//! settings the daemon runs with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DEFAULT_STAT_PATH, DEFAULT_TOPOLOGY_ROOT, GLOBAL_SOURCE, PolicyKind};

/// Margin added to the scaled active count by the margin strategy.
pub const DEFAULT_MARGIN: f64 = 0.2;

/// Extra cores kept online by the scaled-delay strategy.
pub const DEFAULT_HEADROOM: u32 = 2;

/// One configuration layer. Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub policy: Option<PolicyKind>,
    pub interval: Option<String>,
    pub margin: Option<f64>,
    pub headroom: Option<u32>,
    pub topology_root: Option<PathBuf>,
    pub stat_path: Option<PathBuf>,
    pub source: Option<String>,
    pub transition_timeout: Option<String>,
}

impl ConfigOverrides {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay `upper` on top of `self`; fields set in `upper` win.
    pub fn merge(self, upper: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            policy: upper.policy.or(self.policy),
            interval: upper.interval.or(self.interval),
            margin: upper.margin.or(self.margin),
            headroom: upper.headroom.or(self.headroom),
            topology_root: upper.topology_root.or(self.topology_root),
            stat_path: upper.stat_path.or(self.stat_path),
            source: upper.source.or(self.source),
            transition_timeout: upper.transition_timeout.or(self.transition_timeout),
        }
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeConfig {
    pub policy: PolicyKind,
    /// Time between two samples.
    pub interval: Duration,
    pub margin: f64,
    pub headroom: u32,
    pub topology_root: PathBuf,
    pub stat_path: PathBuf,
    /// Counter source name handed to the sampler.
    pub source: String,
    /// Upper bound on a single core transition. `None` waits forever.
    pub transition_timeout: Option<Duration>,
}

impl StakeConfig {
    /// Built-in defaults for a strategy, including its sampling cadence.
    pub fn for_policy(policy: PolicyKind) -> Self {
        Self {
            policy,
            interval: policy.default_interval(),
            margin: DEFAULT_MARGIN,
            headroom: DEFAULT_HEADROOM,
            topology_root: PathBuf::from(DEFAULT_TOPOLOGY_ROOT),
            stat_path: PathBuf::from(DEFAULT_STAT_PATH),
            source: GLOBAL_SOURCE.to_string(),
            transition_timeout: None,
        }
    }

    /// Resolve a merged override layer against the defaults of the chosen
    /// policy and validate the result.
    pub fn resolve(layer: ConfigOverrides) -> ConfigResult<Self> {
        let policy = layer.policy.unwrap_or_default();
        let defaults = Self::for_policy(policy);

        let interval = match layer.interval.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => defaults.interval,
        };
        if interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        let margin = layer.margin.unwrap_or(defaults.margin);
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "margin",
                reason: format!("{margin} is not a non-negative number"),
            });
        }

        let source = layer.source.unwrap_or(defaults.source);
        if source.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "source",
                reason: "must not be empty".to_string(),
            });
        }

        let transition_timeout = layer
            .transition_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        Ok(Self {
            policy,
            interval,
            margin,
            headroom: layer.headroom.unwrap_or(defaults.headroom),
            topology_root: layer.topology_root.unwrap_or(defaults.topology_root),
            stat_path: layer.stat_path.unwrap_or(defaults.stat_path),
            source,
            transition_timeout,
        })
    }
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self::for_policy(PolicyKind::default())
    }
}

/// Parse a duration string like "200ms", "5s", "1m". A bare number is
/// read as seconds.
pub fn parse_duration(s: &str) -> ConfigResult<Duration> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());

    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .map(|m| Duration::from_secs(m * 60))
            .map_err(|_| invalid())
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    }
}
