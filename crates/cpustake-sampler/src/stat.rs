//! Parsing of the kernel statistics file.
//!
//! Layout of a `cpu` line (see `Documentation/filesystems/proc.rst`):
//!
//! ```text
//! label user nice system idle iowait irq softirq steal guest guest_nice
//! ```

use cpustake_core::{GLOBAL_SOURCE, UsageSnapshot};

use crate::error::{SampleError, SampleResult};

/// Label of the aggregate line that backs [`GLOBAL_SOURCE`].
const AGGREGATE_LABEL: &str = "cpu";

/// Fields through `steal` must be present; the guest fields were added
/// later and may be missing on old kernels.
const REQUIRED_FIELDS: usize = 8;

/// Tick counters of one statistics line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuTimes {
    pub fn idle_ticks(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Guest time is already accounted in `user`/`nice` and is left out.
    pub fn busy_ticks(&self) -> u64 {
        [self.user, self.nice, self.system, self.irq, self.softirq, self.steal]
            .into_iter()
            .fold(0u64, u64::saturating_add)
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot::new(self.idle_ticks(), self.busy_ticks())
    }
}

/// Parse one `cpu` line into its label and counters.
pub fn parse_stat_line(line: &str) -> SampleResult<(&str, CpuTimes)> {
    let mut fields = line.split_whitespace();
    let label = fields
        .next()
        .ok_or_else(|| SampleError::Malformed("empty line".to_string()))?;

    let values = fields
        .map(|f| {
            f.parse::<u64>()
                .map_err(|_| SampleError::Malformed(format!("{label}: bad counter {f:?}")))
        })
        .collect::<SampleResult<Vec<u64>>>()?;

    if values.len() < REQUIRED_FIELDS {
        return Err(SampleError::Malformed(format!(
            "{label}: expected at least {REQUIRED_FIELDS} counters, found {}",
            values.len()
        )));
    }

    let at = |i: usize| values.get(i).copied().unwrap_or(0);
    Ok((
        label,
        CpuTimes {
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            iowait: at(4),
            irq: at(5),
            softirq: at(6),
            steal: at(7),
            guest: at(8),
            guest_nice: at(9),
        },
    ))
}

/// Find the counters for a named source in the full file contents.
///
/// `global` is the first line of the file; any other name selects the line
/// carrying that label, e.g. `cpu3`.
pub fn find_source(contents: &str, source: &str) -> SampleResult<CpuTimes> {
    if source == GLOBAL_SOURCE {
        let first = contents
            .lines()
            .next()
            .ok_or_else(|| SampleError::Malformed("empty statistics file".to_string()))?;
        let (label, times) = parse_stat_line(first)?;
        if label != AGGREGATE_LABEL {
            return Err(SampleError::Malformed(format!(
                "first line is {label:?}, expected {AGGREGATE_LABEL:?}"
            )));
        }
        return Ok(times);
    }

    contents
        .lines()
        .find(|line| line.split_whitespace().next() == Some(source))
        .ok_or_else(|| SampleError::SourceNotFound(source.to_string()))
        .and_then(parse_stat_line)
        .map(|(_, times)| times)
}
