// src/main.rs
use anyhow::{Context, Result};
use log::info;
use std::time::Instant;

use matchsync_lib::{
    config::SyncConfig,
    db::{self, PgRowStore},
    sync::{self, SyncStats},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    info!("Starting staged recommendation sync");
    let start_time = Instant::now();

    db::load_env();
    let config = SyncConfig::from_env();

    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;
    info!("Successfully connected to the database");
    let store = PgRowStore::new(pool);

    let records = sync::load_staged_records(&store, &config)
        .await
        .context("Failed to load staged recommendations")?;
    if records.is_empty() {
        info!("No staged recommendations in {}, nothing to do", config.staging_table);
        return Ok(());
    }

    let stats = sync::sync_records(&store, &records, &config).await?;
    log_stats(&stats);

    info!("Sync finished in {:.2?}", start_time.elapsed());
    Ok(())
}

fn log_stats(stats: &SyncStats) {
    info!("Run {} summary:", stats.run_id);
    info!(
        "  Records: {} total, {} updated, {} without effect, {} unmatched",
        stats.total, stats.updated, stats.untouched, stats.unmatched
    );
    info!("  Success rate: {:.1}%", stats.success_rate());
    info!(
        "  Rows touched: {} recommendations, {} announcements",
        stats.recommendation_rows_updated, stats.announcement_rows_updated
    );
    for (label, methods) in [
        ("Company", &stats.company_methods),
        ("Announcement", &stats.announcement_methods),
    ] {
        let mut counts: Vec<_> = methods.iter().collect();
        counts.sort_by_key(|(method, _)| method.as_str());
        for (method, count) in counts {
            info!("  {} matches by {}: {}", label, method, count);
        }
    }
}
