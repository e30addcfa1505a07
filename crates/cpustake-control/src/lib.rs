//! cpustake-control — the control loop.
//!
//! ```text
//! loop (Running):
//!     outcome = sampler.sample(history, source)
//!     if ratio:  plan = policy.plan(ratio, load, cores); request each core
//!     barrier:   await every pending write
//!     sleep(interval) or shutdown signal → ShuttingDown
//!
//! ShuttingDown:
//!     request every core online; barrier; return Ok
//! ```
//!
//! The shutdown signal is only observed between ticks, so a tick is never
//! abandoned with writes in flight.

pub mod error;
pub mod orchestrator;

pub use error::{ControlError, ControlResult};
pub use orchestrator::{LoopState, Orchestrator, TickReport};
