use std::path::Path;

use chainwatch::config::LoggingConfig;
use chainwatch::config::Settings;
use chainwatch::metrics;
use chainwatch::subsystem::load_bootstrap;
use chainwatch::subsystem::Dependencies;
use chainwatch::subsystem::Subsystem;
use chainwatch::utils::open_file_for_append;
use chainwatch::Error;
use chainwatch::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let settings = Settings::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.logging)?;

    let subsystem = Subsystem::new(&settings, Dependencies::from_settings(&settings)?);
    subsystem.start()?;

    let metrics_shutdown = CancellationToken::new();
    if settings.monitoring.metrics_enabled {
        match metrics::bind_server(settings.monitoring.metrics_port, metrics_shutdown.clone()) {
            Ok((_, server)) => {
                tokio::spawn(server);
            }
            Err(e) => {
                error!("metrics server failed to start: {:?}", e);
                subsystem.shutdown().await;
                return Err(e);
            }
        }
    }

    if let Some(path) = &settings.bootstrap_path {
        if let Err(e) = bootstrap(&subsystem, path).await {
            error!("bootstrap failed: {:?}", e);
            subsystem.shutdown().await;
            metrics_shutdown.cancel();
            return Err(e);
        }
    }

    info!("Application started. Waiting for shutdown signal...");
    if let Err(e) = graceful_shutdown().await {
        error!("Failed to listen for shutdown signal: {:?}", e);
    }

    subsystem.shutdown().await;
    metrics_shutdown.cancel();
    info!("Exiting program.");
    Ok(())
}

/// Deploys every session listed in the bootstrap file, stopping at the first failure.
async fn bootstrap(
    subsystem: &Subsystem,
    path: &Path,
) -> Result<()> {
    let sessions = load_bootstrap(path).await?;
    info!(count = sessions.len(), path = %path.display(), "bootstrapping sessions");
    for request in sessions {
        let session_id = subsystem.run_session(request).await?;
        info!(%session_id, "bootstrap session started");
    }
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }
    Ok(())
}

pub fn init_observability(config: &LoggingConfig) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&config.log_dir.join("chainwatch.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::Fatal(format!("invalid log filter: {e}")))?;
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
