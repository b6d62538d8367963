//! volley — a distributed HTTP load generator and measurement tool

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use volley_config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load(cli.config.as_ref())?;

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.to_string());
    init_tracing(&log_level);

    match cli.command {
        Commands::Req {
            args,
            count,
            concurrency,
            auth,
            debug,
            insecure,
            pretty,
            bots,
            bots_file,
            bots_api_key,
        } => {
            let options = commands::req::ReqOptions {
                count,
                concurrency,
                auth,
                debug,
                insecure,
                pretty,
                bots,
                bots_file,
                bots_api_key,
            };
            commands::req::run(options, args, &config).await
        }
        Commands::Bot {
            api_key,
            port,
            bind,
        } => commands::bot::run(api_key, port, bind, &config).await,
        Commands::Stats => commands::stats::run().await,
    }
}

/// Console tracing; records go to stderr so stdout stays pure NDJSON.
fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init avoids a panic if a global subscriber is already set
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("global tracing subscriber already initialized, skipping");
    }
}
