use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{AccountStore, InMemoryStore, PostgresStore};
use crate::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "bank-api")]
#[command(about = "Bank account API with account-bound JWT authorization")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides BANK_API_PORT/PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Keep accounts in memory instead of PostgreSQL")]
        in_memory: bool,

        #[arg(long, help = "Do not create the account table on startup")]
        skip_init: bool,
    },

    #[command(about = "Create the account table and exit")]
    InitDb,

    #[command(about = "Print a token bound to an account number")]
    IssueToken {
        #[arg(long, help = "Account number to embed in the token")]
        account_number: i64,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    tracing::info!("Starting in {:?} mode", config.environment);

    match cli.command {
        Commands::Serve { port, in_memory, skip_init } => serve(config, port, in_memory, skip_init).await,
        Commands::InitDb => {
            let store = connect(&config).await?;
            store.init().await.context("failed to create account table")?;
            store.close().await;
            Ok(())
        }
        Commands::IssueToken { account_number } => {
            let tokens = token_service(&config)?;
            let token = tokens
                .issue_for_number(account_number)
                .context("failed to sign token")?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, port: Option<u16>, in_memory: bool, skip_init: bool) -> anyhow::Result<()> {
    let tokens = token_service(&config)?;

    let store: Arc<dyn AccountStore> = if in_memory {
        tracing::warn!("Using in-memory account store; data is lost on exit");
        Arc::new(InMemoryStore::new())
    } else {
        let store = connect(&config).await?;
        if !skip_init {
            store.init().await.context("failed to create account table")?;
        }
        Arc::new(store)
    };

    let router = server::app(AppState::new(store, tokens), &config);
    server::serve(router, port.unwrap_or(config.api.port)).await
}

async fn connect(config: &AppConfig) -> anyhow::Result<PostgresStore> {
    let url = config
        .database
        .url
        .as_deref()
        .context("Missing configuration: DATABASE_URL")?;

    PostgresStore::connect(url, &config.database)
        .await
        .context("failed to connect to PostgreSQL")
}

fn token_service(config: &AppConfig) -> anyhow::Result<TokenService> {
    TokenService::new(&config.security.jwt_secret, config.security.token_lifetime())
        .context("JWT_SECRET must be set to a non-empty value")
}
