//! cpustake-sampler — utilization from cumulative kernel tick counters.
//!
//! The kernel statistics file exposes, per line, the number of ticks every
//! CPU spent in each state since boot. A single read says nothing about
//! current load; two reads taken an interval apart do:
//!
//! ```text
//! idle  = idle + iowait
//! busy  = user + nice + system + irq + softirq + steal
//!
//! delta_idle  = idle - prev.idle
//! delta_total = (idle + busy) - (prev.idle + prev.busy)
//! ratio       = (delta_total - delta_idle) / delta_total
//! ```
//!
//! The previous read for each counter source is kept in a [`UsageHistory`]
//! owned by the caller. The first sample of a source only records a
//! baseline; a sample whose total did not advance (counter reset, no ticks
//! elapsed) yields no ratio but still replaces the baseline.

pub mod error;
pub mod history;
pub mod sampler;
pub mod stat;

pub use error::{SampleError, SampleResult};
pub use history::{Baseline, UsageHistory};
pub use sampler::{SampleOutcome, UsageSampler, utilization};
pub use stat::{CpuTimes, parse_stat_line};
