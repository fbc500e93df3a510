use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::HeaderName;
use hydra_token_agent::config::proc_loader::file_to_config;
use hydra_token_agent::config::sources::ServiceConfig;
use hydra_token_agent::observability::reporter::TracingReporter;
use hydra_token_agent::server::watch;
use hydra_token_agent::utils::constants::DEFAULT_CONFIG_PATH;
use hydra_token_agent::utils::logging::{self, LogLevel};
use hydra_token_agent::{AuthenticatorOptions, HookedClient, HydraClient, RequestAuthenticator, TokenCache};
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the auth header for a target
    Token {
        #[arg(short, long)]
        target: String,
    },
    /// Send a GET request with the target's auth header attached
    Request {
        #[arg(short, long)]
        target: String,
        #[arg(short, long)]
        url: String,
        /// overrides authenticator.header_name from the config
        #[arg(long)]
        header_name: Option<String>,
    },
    /// Keep a target's token warm and serve metrics
    Watch {
        #[arg(short, long)]
        target: String,
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

type HydraCache = TokenCache<HydraClient>;

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(Path::new(&args.config)).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Token cache over the Hydra client
    // -------------------------------

    let hydra = HydraClient::new(service_config.hydra.clone()).with_reporter(Arc::new(TracingReporter));
    let cache = Arc::new(TokenCache::new(hydra));

    // -------------------------------
    // 3. Run the command
    // -------------------------------

    match args.command {
        Command::Token { target } => {
            let header = cache.auth_header_for_target(&target).await?;
            println!("{}", header);
        }
        Command::Request { target, url, header_name } => {
            request(&service_config, cache, target, url, header_name).await?;
        }
        Command::Watch { target, interval_secs } => {
            let interval = Duration::from_secs(interval_secs.max(1));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("cannot listen for ctrl-c: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            watch::run_watch(&*cache, &target, interval, &service_config.settings, shutdown).await?;
        }
    }

    Ok(())
}

async fn request(
    service_config: &ServiceConfig,
    cache: Arc<HydraCache>,
    target: String,
    url: String,
    header_name: Option<String>,
) -> Result<()> {
    let header_name = header_name.unwrap_or_else(|| service_config.authenticator.header_name.clone());
    let header_name = HeaderName::from_bytes(header_name.as_bytes())
        .with_context(|| format!("invalid header name '{}'", header_name))?;

    let transport = HookedClient::default();
    let detach = RequestAuthenticator::attach(
        &transport,
        AuthenticatorOptions::new(cache, target, |_| true).header_name(header_name),
    );

    let response = transport.send(transport.get(&url)).await?;
    println!("{}", response.status());
    println!("{}", response.text().await?);

    detach.detach();
    Ok(())
}
