//! contextd: per-developer memory and context daemon, exposed as an MCP
//! server over Streamable HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use contextd_application::{AdminService, CheckpointService, Distiller, MemoryService, RemediationService, RepositoryService, Scheduler, TroubleshootService};
use contextd_infrastructure::{EventBus, Git2VcsProvider, LocalEmbedder, OperationRegistry, RegexSecretScanner, SessionStore, load_config, logging, new_store};
use contextd_server::AppState;

#[derive(Parser)]
#[command(name = "contextd")]
#[command(about = "Per-developer memory and context daemon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server.
    Serve {
        /// Config file path, defaults to ~/.config/contextd/config.toml.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured bind port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config, port } => serve(config, port).await,
    }
}

async fn serve(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let vector_store = new_store(&config.vectorstore).await?;

    let embedder = Arc::new(LocalEmbedder::new(0));
    let secret_scanner = Arc::new(RegexSecretScanner::new());
    let vcs = Arc::new(Git2VcsProvider::new());

    let memory = Arc::new(MemoryService::new(Arc::clone(&vector_store), embedder.clone()));
    let checkpoint = Arc::new(CheckpointService::new(Arc::clone(&vector_store), embedder.clone()));
    let remediation = Arc::new(RemediationService::new(Arc::clone(&vector_store), embedder.clone()));
    let repository = Arc::new(RepositoryService::new(Arc::clone(&vector_store), embedder.clone()));
    let admin = Arc::new(AdminService::new(Arc::clone(&vector_store)));
    let troubleshoot = Arc::new(TroubleshootService::new(Arc::clone(&remediation), None));
    let distiller = Arc::new(Distiller::new(Arc::clone(&vector_store), embedder, None));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&distiller),
        Arc::clone(&vector_store),
        Duration::from_secs(config.distiller.schedule_interval_secs.max(1) as u64),
    ));
    scheduler.start().await?;

    let events = Arc::new(EventBus::new());
    let registry = Arc::new(OperationRegistry::new(Arc::clone(&events)));
    let sessions = Arc::new(SessionStore::new());

    let state = Arc::new(AppState {
        sessions,
        registry,
        events,
        vcs,
        vector_store,
        secret_scanner,
        scrub_enabled: config.scrubber.enabled,
        memory,
        checkpoint,
        remediation,
        repository,
        admin,
        troubleshoot,
        distiller,
        scheduler: Arc::clone(&scheduler),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "contextd listening");

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c, shutting down");
        shutdown_signal.cancel();
    });

    axum::serve(listener, contextd_server::router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    scheduler.stop().await;
    Ok(())
}
