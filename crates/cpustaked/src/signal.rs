//! Interrupt wiring.
//!
//! SIGINT and SIGTERM both flip the shutdown channel to `true`. The control
//! loop notices between ticks and restores every core before returning.

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::info;

/// Install the SIGINT/SIGTERM handlers and spawn a task that signals
/// shutdown when either arrives.
///
/// The handlers are registered before this returns, so an interrupt that
/// lands before the task first runs is still delivered to it.
pub fn shutdown_channel() -> std::io::Result<watch::Receiver<bool>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!(signal = name, "interrupt received, re-enabling all cores");
        let _ = tx.send(true);
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_raised_before_task_runs_triggers_shutdown() {
        let mut rx = shutdown_channel().unwrap();

        // Raised before the listener task has been polled even once.
        // SAFETY: raise only delivers a signal to this process, and a
        // handler for SIGTERM is installed above.
        let rc = unsafe { libc::raise(libc::SIGTERM) };
        assert_eq!(rc, 0);

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("shutdown was not signalled")
            .unwrap();
        assert!(*rx.borrow());
    }
}
