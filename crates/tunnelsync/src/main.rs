mod cli;
mod error;

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tunnelsync_api::{TransportConfig, TunnelBrokerClient};
use tunnelsync_core::{Action, CoreError, ReconcileReport, Reconciler, gather_status};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = tunnelsync_config::load_config(cli.config_dir.as_deref())?;
    let limit = cli
        .timeout
        .map_or_else(|| config.timeout(), Duration::from_secs);

    let broker = TunnelBrokerClient::new(config.broker_credentials(), &TransportConfig::new(limit))
        .map_err(CoreError::from)?;
    let router = config.juniper_device();
    let interfaces = config.interface_names();

    let status = gather_status(&broker, &router, &interfaces, limit).await?;

    let report = Reconciler::new(&broker, &router, &interfaces.tunnel, limit)
        .dry_run(cli.dry_run)
        .reconcile(&status)
        .await
        .inspect_err(log_completed)?;

    log_report(&report, &status.external_address);
    Ok(())
}

/// Name the corrections that went through before a failure.
fn log_completed(err: &CoreError) {
    let completed = err.completed_corrections();
    if completed.is_empty() {
        return;
    }
    let list = completed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    error!(completed = %list, "corrections applied before the failure");
}

fn log_report(report: &ReconcileReport, address: &str) {
    if report.is_noop() {
        info!(address, "tunnel broker and router already match the external address");
        return;
    }
    for (side, action) in [
        ("tunnel broker", report.tunnel_broker),
        ("router", report.router),
    ] {
        match action {
            Action::Unchanged => {}
            Action::Planned => info!(side, address, "would update (dry run)"),
            Action::Applied => info!(side, address, "updated"),
        }
    }
}
