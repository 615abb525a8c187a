// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Review Service Host
//!
//! The `critiq-server` binary loads the configuration manifest, wires the
//! object graph (store, index, cache, LLM, usecases) and serves the HTTP
//! and binary RPC transports until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use critiq_core::application::{
    AgentService, AiAuditor, ListingService, ModerationPipeline, ReviewService,
};
use critiq_core::domain::cache::CacheGateway;
use critiq_core::domain::llm::LlmProvider;
use critiq_core::domain::moderation::Moderator;
use critiq_core::domain::repository::ReviewStore;
use critiq_core::domain::search::SearchGateway;
use critiq_core::infrastructure::cache::RedisCache;
use critiq_core::infrastructure::llm::OpenAiAdapter;
use critiq_core::infrastructure::moderation::ModerationClient;
use critiq_core::infrastructure::repositories::PostgresReviewStore;
use critiq_core::infrastructure::search::ElasticGateway;
use critiq_core::infrastructure::{AppConfig, Database, SnowflakeGenerator};
use critiq_core::presentation;

/// Review-management backend host.
#[derive(Parser)]
#[command(name = "critiq-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        env = "CRITIQ_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CRITIQ_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = AppConfig::load_or_default(cli.config)?;

    info!("connecting to postgres");
    let database = Database::new(&config.database.dsn, config.database.max_connections)
        .await
        .context("failed to connect to postgres")?;

    info!("connecting to redis");
    let cache: Arc<dyn CacheGateway> = Arc::new(
        RedisCache::new(&config.redis.addr)
            .await
            .context("failed to connect to redis")?,
    );

    let search: Arc<dyn SearchGateway> =
        Arc::new(ElasticGateway::new(&config.elasticsearch.addresses));

    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiAdapter::new(
        config.llm.endpoint.clone(),
        config.llm.api_key.clone(),
        config.llm.model.clone(),
    ));
    let moderator: Arc<dyn Moderator> = Arc::new(ModerationClient::new(Arc::clone(&llm)));

    let ids = Arc::new(
        SnowflakeGenerator::new(config.snowflake.epoch_ms, config.snowflake.machine_id)
            .context("invalid snowflake configuration")?,
    );

    let store: Arc<dyn ReviewStore> =
        Arc::new(PostgresReviewStore::new(database.get_pool().clone()));

    let auditor = Arc::new(AiAuditor::new(Arc::clone(&store), moderator));
    let pipeline = Arc::new(ModerationPipeline::new(auditor, Arc::clone(&search)));
    let reviews = Arc::new(ReviewService::new(Arc::clone(&store), ids, pipeline));
    let listings = Arc::new(ListingService::new(cache, search));
    let agent = Arc::new(AgentService::new(
        llm,
        Arc::clone(&reviews),
        Arc::clone(&listings),
    ));

    let router = presentation::app(
        Arc::clone(&reviews),
        Arc::clone(&listings),
        Arc::clone(&agent),
    );
    let rpc_state = Arc::new(presentation::AppState {
        reviews,
        listings,
        agent,
    });

    let http_listener = tokio::net::TcpListener::bind(&config.server.http_addr)
        .await
        .with_context(|| format!("failed to bind http address {}", config.server.http_addr))?;
    let rpc_listener = tokio::net::TcpListener::bind(&config.server.rpc_addr)
        .await
        .with_context(|| format!("failed to bind rpc address {}", config.server.rpc_addr))?;

    println!(
        "{} http on {}, rpc on {}",
        "critiq-server running:".green(),
        config.server.http_addr,
        config.server.rpc_addr
    );

    tokio::select! {
        result = axum::serve(http_listener, router) => {
            result.context("http server exited")?;
        }
        result = presentation::rpc::serve(rpc_listener, rpc_state) => {
            result.context("rpc server exited")?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
