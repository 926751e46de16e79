// src/main.rs
use anyhow::{bail, Context, Result};
use hyper::header::HeaderName;
use script_monitor::{
    check::{ProcessRunner, TargetResolver},
    config::{self, Config, LogFormat},
    metrics::{start_metrics_server, MetricsRegistry},
    router::{RequestRouter, TracingEvents},
    server::{CheckHandler, ServerBuilder},
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Config file is optional: MONITORING_* variables alone are enough.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;

    init_tracing(&config)?;
    info!(path = ?config_path, "configuration loaded");

    let scripts_dir = tokio::fs::canonicalize(&config.scripts_dir)
        .await
        .with_context(|| {
            format!("Scripts directory {} is not accessible", config.scripts_dir.display())
        })?;
    if !tokio::fs::metadata(&scripts_dir).await?.is_dir() {
        bail!("Scripts directory {} is not a directory", scripts_dir.display());
    }
    info!(
        scripts_dir = %scripts_dir.display(),
        timeout = ?config.timeout(),
        failure_status = ?config.failure_status,
        "serving checks"
    );

    let mut router = RequestRouter::new(
        TargetResolver::new(scripts_dir),
        Arc::new(ProcessRunner::new(config.timeout())),
        Arc::new(TracingEvents),
    )
    .with_failure_status(config.failure_status);

    if config.metrics_enabled {
        let registry = MetricsRegistry::new()?;
        router = router.with_metrics(registry.collector());
        start_metrics_server(config.metrics_listen, registry, config.metrics_path.clone()).await?;
    }

    let request_id_header = HeaderName::from_bytes(config.request_id_header.as_bytes())
        .with_context(|| format!("Invalid request_id_header {:?}", config.request_id_header))?;
    let handler = CheckHandler::new(Arc::new(router), request_id_header);

    ServerBuilder::new(config.listen)
        .with_handler(handler)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Build the process-wide subscriber once; nothing in the library reaches
/// for it directly.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("Invalid log_level {:?}", config.log_level))?,
    };

    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.log_file.is_none())
        .with_writer(writer);

    match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|err| anyhow::anyhow!("Failed to initialise logging: {err}"))
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
