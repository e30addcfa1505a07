//! Control loop integration tests.
//!
//! Drives a full `Orchestrator::run` against a temporary sysfs tree and
//! statistics file, then interrupts it through the shutdown channel.

use std::fs;
use std::path::Path;
use std::time::Duration;

use cpustake_control::{LoopState, Orchestrator};
use cpustake_core::{CoreId, CoreState, PolicyKind, StakeConfig};
use tokio::sync::watch;

fn fake_topology(root: &Path, states: &[(u32, &str)]) {
    for (id, state) in states {
        let dir = root.join(format!("cpu{id}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("online"), state).unwrap();
    }
    fs::create_dir_all(root.join("cpufreq")).unwrap();
    fs::write(root.join("possible"), "0-3\n").unwrap();
}

fn write_stat(path: &Path, idle: u64, busy: u64) {
    fs::write(
        path,
        format!("cpu  {busy} 0 0 {idle} 0 0 0 0 0 0\ncpu0 0 0 0 0 0 0 0 0 0 0\n"),
    )
    .unwrap();
}

fn config(root: &Path, stat: &Path, policy: PolicyKind) -> StakeConfig {
    let mut config = StakeConfig::for_policy(policy);
    config.topology_root = root.to_path_buf();
    config.stat_path = stat.to_path_buf();
    config.interval = Duration::from_millis(5);
    config.transition_timeout = Some(Duration::from_secs(5));
    config
}

fn online_file(root: &Path, id: u32) -> String {
    fs::read_to_string(root.join(format!("cpu{id}/online"))).unwrap()
}

#[tokio::test]
async fn interrupted_loop_restores_all_cores() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cpu");
    fake_topology(&root, &[(0, "0"), (1, "1"), (2, "0"), (3, "0")]);
    let stat = dir.path().join("stat");
    write_stat(&stat, 1000, 0);

    let mut orch = Orchestrator::from_config(&config(&root, &stat, PolicyKind::Margin)).unwrap();
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let result = orch.run(rx).await;
        (orch, result)
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    tx.send(true).unwrap();

    let (orch, result) = handle.await.unwrap();
    result.unwrap();

    assert_eq!(orch.state(), LoopState::ShuttingDown);
    for id in 0..4 {
        let state = orch.controllers().get(CoreId(id)).unwrap().read_state().unwrap();
        assert_eq!(state, CoreState::Online, "cpu{id}");
        assert!(!orch.controllers().get(CoreId(id)).unwrap().is_pending());
    }
    for id in 1..4 {
        assert_eq!(online_file(&root, id), "1");
    }
}

#[tokio::test]
async fn already_signalled_loop_only_restores() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cpu");
    fake_topology(&root, &[(1, "0"), (2, "1")]);
    let stat = dir.path().join("stat");
    write_stat(&stat, 10, 10);

    let mut orch = Orchestrator::from_config(&config(&root, &stat, PolicyKind::Margin)).unwrap();
    let (_tx, rx) = watch::channel(true);

    orch.run(rx).await.unwrap();

    // No tick ran, so no baseline was recorded.
    assert!(orch.history().is_empty());
    assert_eq!(online_file(&root, 1), "1");
}

#[tokio::test]
async fn dropped_sender_counts_as_interruption() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cpu");
    fake_topology(&root, &[(1, "0")]);
    let stat = dir.path().join("stat");
    write_stat(&stat, 10, 10);

    let mut orch = Orchestrator::from_config(&config(&root, &stat, PolicyKind::Margin)).unwrap();
    let (tx, rx) = watch::channel(false);
    drop(tx);

    orch.run(rx).await.unwrap();
    assert_eq!(online_file(&root, 1), "1");
}

#[tokio::test]
async fn scaled_delay_keeps_small_sets_online() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cpu");
    fake_topology(&root, &[(1, "1"), (2, "1"), (3, "0")]);
    let stat = dir.path().join("stat");
    write_stat(&stat, 100, 100);

    let mut orch =
        Orchestrator::from_config(&config(&root, &stat, PolicyKind::ScaledDelay)).unwrap();
    orch.tick().await.unwrap();

    // 70 idle, 30 busy → r = 0.3, N = 4 → max(ceil(1.2) + 2, 1) = 4.
    write_stat(&stat, 170, 130);
    let report = orch.tick().await.unwrap();

    assert_eq!(report.desired_active, Some(4));
    assert_eq!(report.dispatched, 1);
    assert_eq!(online_file(&root, 3), "1");
}

#[tokio::test]
async fn repeated_ticks_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cpu");
    fake_topology(&root, &[(1, "1"), (2, "1"), (3, "1")]);
    let stat = dir.path().join("stat");
    write_stat(&stat, 0, 0);

    let mut orch = Orchestrator::from_config(&config(&root, &stat, PolicyKind::Margin)).unwrap();
    orch.tick().await.unwrap();

    // Fully idle: only core 0 is wanted.
    write_stat(&stat, 100, 0);
    let first = orch.tick().await.unwrap();
    assert_eq!(first.desired_active, Some(1));
    assert_eq!(first.dispatched, 3);

    // Still idle with a single active core: nothing left to write.
    write_stat(&stat, 200, 0);
    let second = orch.tick().await.unwrap();
    assert_eq!(second.desired_active, Some(1));
    assert_eq!(second.dispatched, 0);

    for id in 1..4 {
        assert_eq!(online_file(&root, id), "0");
    }
}
