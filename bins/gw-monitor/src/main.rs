//! gw-monitor - default gateway monitor with audible and visual alerts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use gwmon::alert::Alerts;
use gwmon::monitor::{DebouncePolicy, MonitorConfig};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "gw-monitor",
    version,
    about = "Monitor default gateway on interface and give audible and visual alerts"
)]
struct Cli {
    /// The interface to be monitored.
    ifname: String,

    /// Settling time after a route change before the table is read [default: 2000].
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Restart the settling time on every further route change.
    #[arg(long)]
    restart_debounce: bool,

    /// LED brightness file.
    #[arg(long, value_name = "PATH")]
    led: Option<PathBuf>,

    /// PC speaker event device.
    #[arg(long, value_name = "PATH")]
    speaker: Option<PathBuf>,

    /// Don't play tone sequences.
    #[arg(long)]
    no_sound: bool,

    /// JSON configuration file; command-line options take precedence.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merge the configuration file (if any) with the command line.
    fn into_config(self) -> anyhow::Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_json_file(path)
                .with_context(|| format!("cannot load {}", path.display()))?,
            None => MonitorConfig::default(),
        };

        config = config.with_interface(self.ifname);
        if let Some(ms) = self.debounce_ms {
            config = config.with_debounce(Duration::from_millis(ms));
        }
        if self.restart_debounce {
            config = config.with_debounce_policy(DebouncePolicy::Restart);
        }
        if let Some(path) = self.led {
            config = config.with_led_path(path);
        }
        if let Some(path) = self.speaker {
            config = config.with_speaker_path(path);
        }
        if self.no_sound {
            config = config.with_sound(false);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match monitor(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn monitor(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config()?;
    let sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let mut alerts = Alerts::from_config(&config);
    alerts.reset();

    let result = gwmon::monitor::run(&config, &mut alerts, shutdown_signal(sigterm)).await;

    alerts.reset();
    result.with_context(|| format!("cannot monitor {}", config.interface))
}

async fn shutdown_signal(mut sigterm: Signal) {
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }
}
