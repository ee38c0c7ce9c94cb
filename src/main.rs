mod config;
mod models;
mod pipeline;
mod scrapers;
mod storage;

use anyhow::Context;
use config::Config;
use pipeline::Crawler;
use scrapers::{HttpTransport, Provider};
use std::sync::Arc;
use storage::RawStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env().context("Failed to load configuration")?;

    info!("🏨 Hostel Scout - availability crawler");
    info!(
        days = cfg.duration_days,
        max_workers = cfg.max_workers,
        max_retries = cfg.max_retries,
        "Loaded configuration"
    );

    let transport = HttpTransport::new(cfg.request_timeout())?;
    let provider = Provider::new(transport, &cfg);
    let raw = RawStore::for_current_run(&cfg.raw_dir);
    info!(run_id = raw.run_id(), raw_dir = %cfg.raw_dir.display(), "Storing raw responses");

    let crawler = Arc::new(Crawler::new(provider, raw, &cfg));
    let summary = crawler.run().await?;

    info!(
        "✅ {} of {} hostels crawled ({} skipped), {} rows written to {}",
        summary.completed(),
        summary.outcomes.len(),
        summary.skipped().count(),
        summary.rows_written,
        cfg.output_path.display()
    );

    Ok(())
}
