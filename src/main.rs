use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use banksync::config::{
    default_config_path, BankCredentials, Config, KvCredentials, LedgerCredentials,
};
use banksync::ledger::YnabClient;
use banksync::sync::{import_statement, SyncService};
use banksync::token_store::{SyncState, TokenStore};

#[derive(Parser)]
#[command(name = "banksync")]
#[command(about = "Sync bank transactions into a YNAB budget")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one bank to ledger sync
    Sync,
    /// Import a card statement CSV into the CSV target account
    ImportCsv {
        /// Statement file (`;`-separated, decimal commas)
        file: PathBuf,
    },
    /// Store the initial bank refresh token
    SetRefreshToken {
        token: String,
    },
    /// Show current configuration
    Config,
}

fn token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    let store = config
        .token_store
        .build(|| Ok(KvCredentials::from_env()?))?;
    Ok(store.into())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Sync => {
            let bank = BankCredentials::from_env()?;
            let ledger = LedgerCredentials::from_env()?;
            let service = SyncService::from_config(&config, &bank, &ledger, token_store(&config)?)?;
            let report = service.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ImportCsv { file } => {
            let ledger_credentials = LedgerCredentials::from_env()?;
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let ledger = YnabClient::from_config(&config.ledger, &ledger_credentials);
            let report =
                import_statement(&ledger, &ledger_credentials.csv_account_id, &content).await?;
            tracing::info!(%report, "Statement import finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::SetRefreshToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("Refresh token must not be empty");
            }
            let store = token_store(&config)?;
            SyncState::new(store.as_ref())
                .set_refresh_token(&SecretString::from(token.to_string()))
                .await?;
            println!("Refresh token stored");
        }
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
