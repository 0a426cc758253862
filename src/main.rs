use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use restock_sentry::AppConfig;
use restock_sentry::classifier::StockClassifier;
use restock_sentry::fetcher::PageFetcher;
use restock_sentry::monitor::StockMonitor;
use restock_sentry::notifier::DiscordSink;
use restock_sentry::registry::{HttpRegistry, ProductRegistry, SqliteRegistry, StaticRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restock_sentry=info".parse()?),
        )
        .init();

    info!("Starting Restock Sentry...");

    // Missing token or channel id is fatal before the loop ever starts.
    let config = AppConfig::from_env()?;

    let registry = build_registry(&config).await?;

    let sink = DiscordSink::new(&config.discord)?;
    let channel_name = sink.resolve_destination().await?;
    info!(channel = %channel_name, "notification channel resolved");

    let fetcher = PageFetcher::new(&config.fetcher)?;
    let classifier = StockClassifier::new(config.registry.default_product_name.clone());

    let monitor = StockMonitor::new(
        registry,
        fetcher,
        classifier,
        Arc::new(sink),
        config.monitor.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    shutdown_tx.send(true).ok();

    // Lets an in-flight alert campaign finish before the process exits.
    monitor_handle.await?;

    Ok(())
}

async fn build_registry(config: &AppConfig) -> Result<Arc<dyn ProductRegistry>> {
    if let Some(database_url) = &config.registry.database_url {
        info!(url = %database_url, "using SQLite product registry");
        let registry = SqliteRegistry::connect(database_url).await?;
        registry.init_schema().await?;
        return Ok(Arc::new(registry));
    }

    if let Some(api_url) = &config.registry.api_url {
        info!(url = %api_url, "using HTTP product registry");
        return Ok(Arc::new(HttpRegistry::new(api_url.clone())?));
    }

    warn!(
        url = %config.registry.default_product_url,
        "no registry backend configured, monitoring the default product only"
    );
    Ok(Arc::new(StaticRegistry::single(
        config.registry.default_product_url.clone(),
        config.registry.default_product_name.clone(),
    )))
}
