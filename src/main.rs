//! sharewatch binary
//!
//! Parses the command line, sets up logging and runs the monitor until
//! Ctrl-C.

use anyhow::Context;
use clap::{ArgAction, Parser};
use sharewatch::constants::ENV_PASSWORD;
use sharewatch::logger::{self, LogOptions};
use sharewatch::platform::{SmbConnector, SystemPinger};
use sharewatch::{standard_probe_set, ConfigLayer, LogReporter, Monitor, MonitorConfig, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Monitor the accessibility of a file share
#[derive(Parser, Debug)]
#[command(name = "sharewatch", version, about, disable_help_flag = true)]
struct Cli {
    /// Host to monitor
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// CIFS port [default: 445]
    #[arg(short = 'p', long)]
    port: Option<u32>,

    /// CIFS user
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// CIFS domain
    #[arg(short = 'd', long)]
    domain: Option<String>,

    /// CIFS workstation
    #[arg(short = 's', long)]
    workstation: Option<String>,

    /// CIFS password
    #[arg(short = 'w', long, env = ENV_PASSWORD, hide_env_values = true)]
    password: Option<String>,

    /// File to read on every tick (empty disables the check)
    #[arg(short = 'f', long)]
    filename: Option<String>,

    /// Milliseconds between ticks [default: 1000]
    #[arg(short = 't', long)]
    ticktime: Option<u64>,

    /// JSON file with any of the options above
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append log output to this file as well
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            domain: self.domain.clone(),
            workstation: self.workstation.clone(),
            password: self.password.clone(),
            filename: self.filename.clone(),
            ticktime: self.ticktime,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_logging(&LogOptions {
        verbose: LogOptions::verbose_requested(cli.verbose),
        file: cli.log_file.clone(),
    })
    .context("initialising logging")?;

    let config = MonitorConfig::load(cli.config.as_deref(), cli.layer())
        .context("loading configuration")?;

    info!(
        host = %config.host,
        port = config.port,
        file = %config
            .filename
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        tick_ms = config.tick.as_millis() as u64,
        "monitor starting"
    );

    let probes = standard_probe_set(
        &config,
        Arc::new(SystemPinger::new()),
        Arc::new(SmbConnector::new()),
    );
    let mut monitor = Monitor::new(probes, Box::new(LogReporter));

    let ticks = Scheduler::new(config.tick)
        .run(&mut monitor, shutdown_signal())
        .await?;

    info!(ticks, "monitor stopped");
    Ok(())
}
