use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plexpost_core::{
    load_config, validate_config, FlowPlugin, FlowScheduler, FsTransfer, HomeAssistantSwitch,
    NoopWake, PostProcessor, SftpTransfer, TorrentClient, TransferSink, TransmissionClient,
    WakeSignal,
};
use plexpost_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Config files from the command line, else `PLEXPOST_CONFIG` (comma separated),
/// else `config.toml`. Later files override earlier ones.
fn config_paths() -> Vec<PathBuf> {
    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if !args.is_empty() {
        return args;
    }

    std::env::var("PLEXPOST_CONFIG")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_else(|_| vec![PathBuf::from("config.toml")])
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("plexpost {} starting", VERSION);

    let config_paths = config_paths();
    info!("Loading configuration from {:?}", config_paths);
    let config = load_config(&config_paths)
        .with_context(|| format!("Failed to load config from {:?}", config_paths))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let torrent_client: Arc<dyn TorrentClient> = Arc::new(
        TransmissionClient::new(config.transmission.clone())
            .context("Failed to create Transmission client")?,
    );
    info!("Using Transmission at {}", config.transmission.url);

    let transfer: Arc<dyn TransferSink> = match (&config.transfer, &config.sftp) {
        (_, Some(sftp)) => {
            info!("Transferring over SFTP to {} in {}", sftp.target(), sftp.remote_dir);
            Arc::new(SftpTransfer::new(sftp.clone()))
        }
        (Some(fs), None) => {
            info!("Transferring to {:?}", fs.remote_root);
            Arc::new(FsTransfer::new(fs.clone()))
        }
        (None, None) => anyhow::bail!("No transfer destination configured"),
    };

    let wake: Arc<dyn WakeSignal> = match &config.home_assistant {
        Some(ha) => {
            info!("Waking media server through switch.{}", ha.htpc_switch);
            Arc::new(
                HomeAssistantSwitch::new(ha.clone())
                    .context("Failed to create Home Assistant client")?,
            )
        }
        None => {
            info!("Home Assistant not configured, media server will not be woken");
            Arc::new(NoopWake)
        }
    };

    // One processor per configured flow; cycles of different flows never overlap
    let cycle_lock = Arc::new(Mutex::new(()));
    let processors: Vec<PostProcessor> = config
        .flows
        .configured()
        .into_iter()
        .map(|(kind, flow_config)| {
            info!(
                flow = kind.as_str(),
                download_dir_tag = %flow_config.download_dir_tag,
                "Flow configured"
            );
            PostProcessor::new(
                FlowPlugin::new(kind, flow_config),
                Arc::clone(&torrent_client),
                Arc::clone(&transfer),
                Arc::clone(&wake),
            )
            .with_cycle_lock(Arc::clone(&cycle_lock))
        })
        .collect();

    let scheduler = Arc::new(FlowScheduler::new(
        processors,
        Duration::from_secs(config.scheduler.interval_secs),
    ));
    scheduler.start().await;

    if config.server.enabled {
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let app = create_router(Arc::new(AppState::new(
            config.clone(),
            Arc::clone(&scheduler),
        )));

        info!("Starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
    } else {
        info!("Status API disabled");
        shutdown_signal().await;
    }

    info!("Shutting down...");
    scheduler.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
