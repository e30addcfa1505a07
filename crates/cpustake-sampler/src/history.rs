//! Per-source baselines between two samples.

use std::collections::HashMap;

use cpustake_core::UsageSnapshot;

/// The last snapshot recorded for a counter source, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    /// Nothing recorded yet; the next sample only establishes a baseline.
    #[default]
    NoBaseline,
    Baseline(UsageSnapshot),
}

/// Most recent snapshot per counter source.
///
/// Lives as long as the control loop that owns it and is never persisted.
#[derive(Debug, Clone, Default)]
pub struct UsageHistory {
    entries: HashMap<String, Baseline>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline for `source`; [`Baseline::NoBaseline`] when never sampled.
    pub fn baseline(&self, source: &str) -> Baseline {
        self.entries.get(source).copied().unwrap_or_default()
    }

    /// Store `snapshot` as the new baseline, returning the previous one.
    pub fn record(&mut self, source: &str, snapshot: UsageSnapshot) -> Baseline {
        self.entries
            .insert(source.to_string(), Baseline::Baseline(snapshot))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_has_no_baseline() {
        let history = UsageHistory::new();
        assert_eq!(history.baseline("global"), Baseline::NoBaseline);
        assert!(history.is_empty());
    }

    #[test]
    fn record_returns_previous_baseline() {
        let mut history = UsageHistory::new();
        let first = UsageSnapshot::new(10, 5);
        let second = UsageSnapshot::new(20, 9);

        assert_eq!(history.record("global", first), Baseline::NoBaseline);
        assert_eq!(history.record("global", second), Baseline::Baseline(first));
        assert_eq!(history.baseline("global"), Baseline::Baseline(second));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn sources_are_independent() {
        let mut history = UsageHistory::new();
        history.record("global", UsageSnapshot::new(1, 1));
        assert_eq!(history.baseline("cpu1"), Baseline::NoBaseline);
    }
}
