//! CLI for running the catalog ingestion pipeline against a source document
//! without going through the HTTP surface.

use anyhow::{Context, Result};
use clap::Parser;
use reelrank::db::Db;
use reelrank::ingest;
use reelrank::util::env as env_util;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ingest", about = "Bulk-load scraped movie records into the catalog")]
struct Cli {
    /// Source JSON document; defaults to MOVIES_JSON_PATH.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Database DSN; defaults to DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    reelrank::tracing::init_tracing("info,sqlx=warn")?;

    let cli = Cli::parse();
    let input = cli.input.unwrap_or_else(env_util::source_path);
    let database_url = cli.database_url.unwrap_or_else(env_util::db_url);
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);

    let db = Db::connect(&database_url, max_conns)
        .await
        .context("Db::connect failed")?;

    let summary = ingest::ingest_file(&db, &input)
        .await
        .with_context(|| format!("ingestion failed for {}", input.display()))?;

    info!(
        inserted = summary.inserted_count,
        input = %input.display(),
        "ingestion complete"
    );
    Ok(())
}
