use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use simplesync::signal::{cancel_on_signal, join_listener};
use simplesync::{gitops, logging, Cli, GitCli, KubectlApplier, SyncConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = SyncConfig::from(Cli::parse());

    if let Err(e) = logging::init_logging(config.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        repository = %config.repository,
        interval_secs = config.interval_secs,
        on_failure = ?config.on_failure,
        "SimpleSync starting"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    let transport = Arc::new(GitCli::new(&config.git_binary));
    let applier = Arc::new(
        KubectlApplier::new(&config.kubectl_binary)
            .with_context(config.kube_context.clone())
            .with_dry_run(config.dry_run),
    );

    let shutdown = CancellationToken::new();
    let signals = cancel_on_signal(shutdown.clone());

    let result = gitops::run(&config, transport, applier, shutdown.clone()).await;
    shutdown.cancel();
    join_listener(signals).await;

    match result {
        Ok(()) => {
            info!("SimpleSync stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Application failed");
            ExitCode::FAILURE
        }
    }
}
