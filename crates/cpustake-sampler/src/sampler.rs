//! Usage sampler — turns consecutive counter reads into a ratio.

use std::path::{Path, PathBuf};

use cpustake_core::UsageSnapshot;
use tracing::{debug, trace};

use crate::error::{SampleError, SampleResult};
use crate::history::{Baseline, UsageHistory};
use crate::stat::find_source;

/// Result of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Busy share of the ticks elapsed since the previous sample, in `[0, 1]`.
    Ratio(f64),
    /// First sample for this source; a baseline was recorded.
    NeedBaseline,
    /// Total ticks did not advance (counter reset or no elapsed time).
    NoProgress,
}

impl SampleOutcome {
    pub fn ratio(self) -> Option<f64> {
        match self {
            SampleOutcome::Ratio(r) => Some(r),
            SampleOutcome::NeedBaseline | SampleOutcome::NoProgress => None,
        }
    }
}

/// Compute the outcome of moving from `previous` to `next`.
pub fn utilization(previous: &Baseline, next: UsageSnapshot) -> SampleOutcome {
    let prev = match previous {
        Baseline::NoBaseline => return SampleOutcome::NeedBaseline,
        Baseline::Baseline(prev) => prev,
    };

    let delta_idle = next.idle_ticks as i128 - prev.idle_ticks as i128;
    let delta_total = next.total() as i128 - prev.total() as i128;
    if delta_total <= 0 {
        return SampleOutcome::NoProgress;
    }

    // Idle and busy counters are read in one pass but can still move
    // independently across a reset; keep the ratio inside [0, 1].
    let ratio = (delta_total - delta_idle) as f64 / delta_total as f64;
    SampleOutcome::Ratio(ratio.clamp(0.0, 1.0))
}

/// Reads the kernel statistics file and samples named counter sources.
#[derive(Debug, Clone)]
pub struct UsageSampler {
    stat_path: PathBuf,
}

impl UsageSampler {
    pub fn new(stat_path: impl Into<PathBuf>) -> Self {
        Self {
            stat_path: stat_path.into(),
        }
    }

    pub fn stat_path(&self) -> &Path {
        &self.stat_path
    }

    /// Read the current counters for `source` without touching history.
    pub fn read_snapshot(&self, source: &str) -> SampleResult<UsageSnapshot> {
        let contents =
            std::fs::read_to_string(&self.stat_path).map_err(|err| SampleError::Read {
                path: self.stat_path.clone(),
                source: err,
            })?;
        Ok(find_source(&contents, source)?.snapshot())
    }

    /// Sample `source`, compare against its stored baseline, and replace the
    /// baseline with the fresh snapshot.
    ///
    /// On read or parse failure the history is left unchanged.
    pub fn sample(&self, history: &mut UsageHistory, source: &str) -> SampleResult<SampleOutcome> {
        let snapshot = self.read_snapshot(source)?;
        let previous = history.record(source, snapshot);
        let outcome = utilization(&previous, snapshot);

        match outcome {
            SampleOutcome::Ratio(ratio) => trace!(%source, ratio, "sampled usage"),
            SampleOutcome::NeedBaseline => debug!(%source, "recorded usage baseline"),
            SampleOutcome::NoProgress => {
                debug!(%source, ?snapshot, "tick counters did not advance, skipping")
            }
        }

        Ok(outcome)
    }
}
