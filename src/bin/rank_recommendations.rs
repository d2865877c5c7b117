// src/bin/rank_recommendations.rs
use anyhow::{Context, Result, bail};
use chrono::Local;
use log::info;

use matchsync_lib::{
    config::{LEGACY_RECOMMENDATION_TABLE, MAX_RECOMMENDATIONS},
    db::{self, PgRowStore},
    ranking::{load_company_recommendations, top_recommendations},
    schedule::{days_until, format_reason, support_status},
};

const USAGE: &str = "usage: rank_recommendations <company_name> [limit]";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(company_name) = args.first() else {
        bail!(USAGE);
    };
    let limit = match args.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("Invalid limit '{}'. {}", raw, USAGE))?,
        None => MAX_RECOMMENDATIONS,
    };

    db::load_env();
    let table = std::env::var("MATCHSYNC_RANKING_TABLE")
        .unwrap_or_else(|_| LEGACY_RECOMMENDATION_TABLE.to_string());
    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;
    let store = PgRowStore::new(pool);

    let records = load_company_recommendations(&store, &table, "기업명", company_name).await?;
    let ranked = top_recommendations(records, limit);
    info!("Showing {} recommendations for '{}'", ranked.len(), company_name);

    let now = Local::now().naive_local();
    for (rank, rec) in ranked.iter().enumerate() {
        let status = support_status(
            rec.application_start_date.as_deref(),
            rec.application_end_date.as_deref(),
            now,
        );
        let dday = rec
            .application_end_date
            .as_deref()
            .and_then(|due| days_until(due, now.date()))
            .map(|d| format!("D{:+}", -d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>2}. [{:>5.1}] {} ({}, {})",
            rank + 1,
            rec.rank_score(),
            rec.announcement_title,
            status.as_str(),
            dday
        );
        println!("      {}", format_reason(rec.reason.as_deref(), rec.rank_score()));
        if let Some(url) = &rec.detail_page_url {
            println!("      {}", url);
        }
    }
    Ok(())
}
