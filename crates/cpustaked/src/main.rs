//! cpustaked — the cpustake daemon.
//!
//! Samples system-wide CPU usage and brings cores online or offline so
//! that just enough of them serve the current load. On SIGINT/SIGTERM every
//! core is brought back online before the process exits.
//!
//! # Usage
//!
//! ```text
//! sudo cpustaked --policy margin
//! sudo cpustaked --policy scaled-delay --interval 5s --config /etc/cpustake.toml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cpustake_control::Orchestrator;
use cpustake_core::{ConfigOverrides, PolicyKind, StakeConfig};

mod privilege;
mod signal;

#[derive(Parser, Debug)]
#[command(
    name = "cpustaked",
    about = "Keeps just enough CPU cores online for the current load",
    version
)]
struct Cli {
    /// Core-count strategy: `margin` (fast cadence) or `scaled-delay`.
    #[arg(short, long)]
    policy: Option<PolicyKind>,

    /// Time between samples, e.g. `200ms`, `5s`. Defaults per policy.
    #[arg(short, long)]
    interval: Option<String>,

    /// Margin added by the margin strategy.
    #[arg(long)]
    margin: Option<f64>,

    /// Extra cores kept online by the scaled-delay strategy.
    #[arg(long)]
    headroom: Option<u32>,

    /// TOML config file. Flags override values from the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the cpu<N>/online controls.
    #[arg(long)]
    topology_root: Option<PathBuf>,

    /// Kernel statistics file.
    #[arg(long)]
    stat_path: Option<PathBuf>,

    /// Give up on a core transition after this long. Waits forever if unset.
    #[arg(long)]
    transition_timeout: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            policy: self.policy,
            interval: self.interval.clone(),
            margin: self.margin,
            headroom: self.headroom,
            topology_root: self.topology_root.clone(),
            stat_path: self.stat_path.clone(),
            source: None,
            transition_timeout: self.transition_timeout.clone(),
        }
    }

    fn resolve(&self) -> anyhow::Result<StakeConfig> {
        let file = match &self.config {
            Some(path) => ConfigOverrides::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ConfigOverrides::default(),
        };
        StakeConfig::resolve(file.merge(self.overrides())).context("invalid configuration")
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,cpustaked=debug,cpustake=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.resolve()?;
    privilege::ensure_root()?;
    let shutdown = signal::shutdown_channel().context("installing signal handlers")?;

    info!(
        policy = %config.policy,
        interval_ms = config.interval.as_millis() as u64,
        topology_root = ?config.topology_root,
        "cpustaked starting"
    );

    let mut orchestrator =
        Orchestrator::from_config(&config).context("discovering manageable cores")?;

    orchestrator.run(shutdown).await?;

    info!("cpustaked stopped");
    Ok(())
}
