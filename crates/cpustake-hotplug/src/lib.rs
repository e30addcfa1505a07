//! cpustake-hotplug — discovery and control of hot-pluggable cores.
//!
//! Cores are discovered from the `cpu<N>` directories directly under the
//! topology root and toggled through `<root>/cpu<N>/online`. Each core has
//! one [`CoreController`]; writes run on tokio's blocking pool so several
//! cores can transition at once, and [`ControllerSet::barrier`] waits for
//! all of them before the caller reads state again.
//!
//! Core 0 is never written: its controller reports it online and ignores
//! every request.

pub mod controller;
pub mod enumerate;
pub mod error;
pub mod set;

pub use controller::CoreController;
pub use enumerate::discover_cores;
pub use error::{HotplugError, HotplugResult};
pub use set::ControllerSet;
