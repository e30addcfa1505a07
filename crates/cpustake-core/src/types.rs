//! Shared types used across cpustake crates.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Where the kernel exposes per-core hotplug controls.
pub const DEFAULT_TOPOLOGY_ROOT: &str = "/sys/devices/system/cpu";

/// Kernel-wide tick counters.
pub const DEFAULT_STAT_PATH: &str = "/proc/stat";

/// Counter source backed by the aggregate `cpu` line.
pub const GLOBAL_SOURCE: &str = "global";

/// Logical core identifier.
///
/// Core 0 is the boot core: it is always online and never transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(pub u32);

impl CoreId {
    pub const BOOT: CoreId = CoreId(0);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_boot(self) -> bool {
        self == Self::BOOT
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu{}", self.0)
    }
}

impl From<u32> for CoreId {
    fn from(id: u32) -> Self {
        CoreId(id)
    }
}

/// Hotplug state of a core as seen in its `online` control file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreState {
    Online,
    Offline,
}

impl CoreState {
    pub fn from_active(active: bool) -> Self {
        if active {
            CoreState::Online
        } else {
            CoreState::Offline
        }
    }

    /// Parse the contents of an `online` file (`"0"` or `"1"`, trailing
    /// newline allowed).
    pub fn from_sysfs(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(CoreState::Online),
            "0" => Some(CoreState::Offline),
            _ => None,
        }
    }

    /// The value written to an `online` file to request this state.
    pub fn as_sysfs(self) -> &'static str {
        match self {
            CoreState::Online => "1",
            CoreState::Offline => "0",
        }
    }

    pub fn is_online(self) -> bool {
        self == CoreState::Online
    }
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreState::Online => f.write_str("online"),
            CoreState::Offline => f.write_str("offline"),
        }
    }
}

/// Cumulative idle and busy ticks since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageSnapshot {
    pub idle_ticks: u64,
    pub busy_ticks: u64,
}

impl UsageSnapshot {
    pub fn new(idle_ticks: u64, busy_ticks: u64) -> Self {
        Self {
            idle_ticks,
            busy_ticks,
        }
    }

    /// Total ticks, widened so that sums of two large counters never wrap.
    pub fn total(&self) -> u128 {
        self.idle_ticks as u128 + self.busy_ticks as u128
    }
}

/// Selectable core-count strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// `ceil(r * active + margin)` cores, sampled frequently.
    #[default]
    Margin,
    /// `max(ceil(r * N) + headroom, 1)` cores, sampled slowly.
    ScaledDelay,
}

impl PolicyKind {
    /// Sampling cadence used when none is configured.
    pub fn default_interval(self) -> Duration {
        match self {
            PolicyKind::Margin => Duration::from_millis(200),
            PolicyKind::ScaledDelay => Duration::from_secs(5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Margin => "margin",
            PolicyKind::ScaledDelay => "scaled-delay",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "margin" => Ok(PolicyKind::Margin),
            "scaled-delay" | "scaled_delay" => Ok(PolicyKind::ScaledDelay),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_state_parses_sysfs_values() {
        assert_eq!(CoreState::from_sysfs("1\n"), Some(CoreState::Online));
        assert_eq!(CoreState::from_sysfs("0"), Some(CoreState::Offline));
        assert_eq!(CoreState::from_sysfs(""), None);
        assert_eq!(CoreState::from_sysfs("2"), None);
    }

    #[test]
    fn core_state_sysfs_values_match_state() {
        assert_eq!(CoreState::from_active(true).as_sysfs(), "1");
        assert_eq!(CoreState::from_active(false).as_sysfs(), "0");
    }

    #[test]
    fn core_zero_is_boot() {
        assert!(CoreId(0).is_boot());
        assert!(!CoreId(1).is_boot());
        assert_eq!(CoreId(7).to_string(), "cpu7");
    }

    #[test]
    fn snapshot_total_does_not_wrap() {
        let snap = UsageSnapshot::new(u64::MAX, u64::MAX);
        assert_eq!(snap.total(), 2 * u64::MAX as u128);
    }

    #[test]
    fn policy_kind_from_str() {
        assert_eq!("margin".parse::<PolicyKind>().unwrap(), PolicyKind::Margin);
        assert_eq!(
            "Scaled-Delay".parse::<PolicyKind>().unwrap(),
            PolicyKind::ScaledDelay
        );
        assert!("greedy".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn policy_kind_default_intervals() {
        assert_eq!(PolicyKind::Margin.default_interval(), Duration::from_millis(200));
        assert_eq!(PolicyKind::ScaledDelay.default_interval(), Duration::from_secs(5));
    }
}
