use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use banksync::config::{
    default_config_path, BankCredentials, BasicAuthCredentials, Config, KvCredentials,
    LedgerCredentials,
};
use banksync::sync::SyncService;
use banksync::token_store::TokenStore;
use banksync_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "banksync-server")]
#[command(about = "Serve the banksync sync and statement upload endpoints")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    let bank = BankCredentials::from_env()?;
    let ledger = LedgerCredentials::from_env()?;
    let basic_auth = BasicAuthCredentials::from_env()?;
    let token_store: Arc<dyn TokenStore> = config
        .token_store
        .build(|| Ok(KvCredentials::from_env()?))?
        .into();

    let sync = SyncService::from_config(&config, &bank, &ledger, token_store)?;
    let app = build_router(AppState::new(sync, basic_auth));

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    tracing::info!(address = %cli.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}
