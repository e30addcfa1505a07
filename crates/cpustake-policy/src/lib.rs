//! cpustake-policy — how many cores a utilization ratio calls for.
//!
//! Two independent strategies are provided and selected by [`PolicyKind`]:
//!
//! ```text
//! margin:        desired = ceil(r * active + margin)      online iff id <  desired
//! scaled-delay:  desired = max(ceil(r * N) + headroom, 1) online iff id <= desired
//! ```
//!
//! `active` is the number of cores online when the sample was taken, `N`
//! the number of managed cores. Both are monotonic in `r`, and core 0 is
//! always planned online.

pub mod margin;
pub mod policy;
pub mod scaled;

pub use margin::MarginPolicy;
pub use policy::{LoadContext, Plan, Policy, build_policy};
pub use scaled::ScaledDelayPolicy;

pub use cpustake_core::PolicyKind;
