//! fedsearch
//!
//! Token-gated federated search server.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedsearch_api::{FedsearchConfig, Server};

/// fedsearch - token-gated federated search endpoint
#[derive(Parser, Debug)]
#[command(name = "fedsearch")]
#[command(version, about = "Token-gated federated search endpoint", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long, env = "FEDSEARCH_CONFIG")]
        config: Option<PathBuf>,

        /// Socket address to bind, overriding the configuration
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print a bcrypt hash of TOKEN for `auth.bearer_hash`
    HashToken {
        /// Shared secret to hash
        token: String,

        /// Bcrypt cost factor
        #[arg(long, default_value_t = 12)]
        cost: u32,
    },
    /// Load and validate a configuration file
    CheckConfig {
        /// Configuration file path
        #[arg(short, long, env = "FEDSEARCH_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fedsearch=debug".into()),
        )
        .init();

    match args.command {
        Command::Serve { config, bind } => {
            let mut config = FedsearchConfig::load(config.as_deref())
                .context("failed to load configuration")?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let server = Server::from_config(config).context("failed to start server")?;
            server.run().await?;
        }
        Command::HashToken { token, cost } => {
            let hash = fedsearch_auth::hash_token(&token, cost)?;
            println!("{hash}");
        }
        Command::CheckConfig { config } => {
            let config = FedsearchConfig::load(config.as_deref())
                .context("failed to load configuration")?;
            config.validate()?;
            tracing::info!(
                route = %config.server.route,
                backend = %config.search.backend,
                auth = config.auth.enabled,
                "configuration is valid"
            );
        }
    }

    Ok(())
}
