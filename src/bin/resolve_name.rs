// src/bin/resolve_name.rs
use anyhow::{Context, Result, bail};
use log::info;
use std::time::Instant;

use matchsync_lib::{
    MatchResolver, RowStore,
    db::{self, PgRowStore},
    models::entities_from_rows,
};

const USAGE: &str = "usage: resolve_name <table> <name_column> <query> [id_column] [--companies]";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let company_mode = match args.iter().position(|a| a == "--companies") {
        Some(idx) => {
            args.remove(idx);
            true
        }
        None => false,
    };
    if args.len() < 3 || args.len() > 4 {
        bail!(USAGE);
    }
    let (table, name_column, query) = (&args[0], &args[1], &args[2]);
    let id_column = args.get(3).map(String::as_str).unwrap_or("id");

    let start_time = Instant::now();
    db::load_env();
    let pool = db::connect()
        .await
        .context("Failed to connect to database")?;
    let store = PgRowStore::new(pool);

    let rows = store.fetch_rows(table).await?;
    let candidates = entities_from_rows(&rows, id_column, name_column, true)
        .with_context(|| format!("Malformed row in {}", table))?;
    info!("Loaded {} candidates from {}.{}", candidates.len(), table, name_column);

    let resolver = if company_mode {
        MatchResolver::for_companies()
    } else {
        MatchResolver::for_announcements()
    };
    let result = resolver.resolve(query, &candidates);

    match (&result.matched_id, result.method) {
        (Some(id), Some(method)) => {
            let name = candidates
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.as_str())
                .unwrap_or_default();
            match result.confidence {
                Some(confidence) => println!("{}\t{}\t{} ({})", id, name, method, confidence),
                None => println!("{}\t{}\t{}", id, name, method),
            }
        }
        _ => println!("no match"),
    }

    info!("Resolved in {:.2?}", start_time.elapsed());
    Ok(())
}
