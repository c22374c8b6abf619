mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rankdelivery_core::{
    create_dispatch_context, handle_command, load_config, validate_config, ActionExecutor,
    DeliveryBackend, DeliveryBridge, DeliveryProcessor, HttpBackendClient, LoggingExecutor,
    ProcessExecutor, VERSION,
};

use console::{parse_line, ConsoleSender};

/// Buffer size for the dispatch job queue
const DISPATCH_BUFFER_SIZE: usize = 64;

/// How long to wait for queued commands on shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr; stdout belongs to the operator console.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var("RANKDELIVERY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("API URL: {}", config.api.url);
    info!("Configured packages: {}", config.commands.len());

    let backend: Arc<dyn DeliveryBackend> = Arc::new(
        HttpBackendClient::new(&config.api).context("Failed to create backend client")?,
    );

    let executor: Box<dyn ActionExecutor> = match &config.dispatch {
        Some(dispatch) => {
            info!("Dispatching commands through {:?}", dispatch.program);
            Box::new(ProcessExecutor::new(dispatch.clone()))
        }
        None => {
            warn!("No [dispatch] program configured, commands will only be logged");
            Box::new(LoggingExecutor::new())
        }
    };

    let (dispatcher, worker) = create_dispatch_context(executor, DISPATCH_BUFFER_SIZE);
    let worker_handle = tokio::spawn(worker.run());

    let processor = Arc::new(DeliveryProcessor::from_config(&config, backend, dispatcher));
    let bridge = Arc::new(DeliveryBridge::new(config, processor).with_config_path(&config_path));

    bridge
        .enable()
        .await
        .context("Failed to start polling")?;
    info!("Rank delivery agent v{} started", VERSION);

    run_console(&bridge).await;

    info!("Shutting down...");
    bridge.disable().await;

    // The worker exits once every dispatcher handle is gone.
    drop(bridge);
    if tokio::time::timeout(DRAIN_TIMEOUT, worker_handle)
        .await
        .is_err()
    {
        warn!("Dispatch worker did not finish in time");
    } else {
        info!("Dispatch worker stopped");
    }

    Ok(())
}

/// Serve console commands until a shutdown signal arrives.
async fn run_console(bridge: &Arc<DeliveryBridge>) {
    let sender = Arc::new(ConsoleSender);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Some(args) = parse_line(&line) {
                        handle_command(bridge, sender.clone(), &args).await;
                    }
                }
                Ok(None) => {
                    info!("Console input closed");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    stdin_open = false;
                }
            },
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
