//! Startup privilege check.

use anyhow::bail;

/// The hotplug `online` files are only writable by root.
pub fn ensure_root() -> anyhow::Result<()> {
    // SAFETY: geteuid has no preconditions and always succeeds.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        bail!("cpustaked must run as root to toggle cores (effective uid is {euid})");
    }
    Ok(())
}
