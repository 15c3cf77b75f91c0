use anyhow::Result;
use clap::Parser;
use ponte::bus::JobQueue;
use ponte::cache::{CacheManager, MemoryCacheStore};
use ponte::channels::EvolutionClient;
use ponte::config::load_config;
use ponte::gateway::{self, AppState};
use ponte::pipeline::Pipeline;
use ponte::providers::build_chain;
use ponte::session::InMemorySessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "ponte")]
#[command(about = "WhatsApp to LLM message dispatch bridge", version)]
struct Cli {
    /// Config file path (defaults to ~/.ponte/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the gateway bind host
    #[arg(long)]
    host: Option<String>,
    /// Override the gateway port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let sessions = Arc::new(InMemorySessionStore::new(
        config.session.max_turns,
        config.session.max_sessions,
    ));
    let cache = Arc::new(CacheManager::new(
        Arc::new(MemoryCacheStore::new()),
        config.cache.enabled,
        config.cache.prefix.clone(),
        Duration::from_secs(config.cache.ttl_secs),
        config.cache.max_entries,
    ));
    let chain = Arc::new(build_chain(&config.providers)?);
    info!("fallback chain ready with {} provider(s)", chain.len());

    let evolution = Arc::new(EvolutionClient::new(
        &config.delivery.base_url,
        &config.delivery.api_key,
        &config.delivery.instance,
        Duration::from_secs(config.delivery.timeout_secs),
    ));

    let pipeline = Arc::new(Pipeline::new(
        sessions.clone(),
        cache,
        chain,
        evolution.clone(),
        config.cache.scope_by_conversation,
        config.pipeline.error_notice.clone(),
    ));

    let worker_pipeline = pipeline.clone();
    let queue = Arc::new(JobQueue::start(config.queue.workers, move |job| {
        let pipeline = worker_pipeline.clone();
        async move { pipeline.handle_job(job).await }
    }));

    let state = AppState {
        queue,
        pipeline,
        sessions,
        evolution,
        webhook_url: config.delivery.webhook_url.clone(),
    };
    let server = gateway::start(&config.gateway.host, config.gateway.port, state).await?;
    info!("ponte {} running", ponte::VERSION);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.abort();
    Ok(())
}
