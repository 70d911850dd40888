use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::error::{classify_db, IngestError};
use super::record::{self, RawBatch};
use super::resolve::{resolve, RefKind};
use super::writer::{self, ResolvedMovie};
use crate::db::Db;

/// Result summary returned to the caller after a committed batch.
#[derive(Debug, Serialize)]
pub struct IngestSummary {
    #[serde(rename = "insertedCount")]
    pub inserted_count: usize,
}

/// Load the source document from disk and ingest it.
#[instrument(skip(db))]
pub async fn ingest_file(db: &Db, path: &Path) -> Result<IngestSummary, IngestError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| IngestError::SourceUnavailable(format!("{}: {e}", path.display())))?;
    let batch: RawBatch = serde_json::from_str(&raw).map_err(IngestError::SourceMalformed)?;
    ingest_batch(db, batch).await
}

/// Drive one batch through the pipeline: normalize and resolve every record,
/// then commit all movie inserts in a single transaction.
///
/// The first malformed record aborts the whole batch before any movie write.
/// Reference rows created during resolution commit eagerly and deliberately
/// survive a later abort; only movie/join/ranking rows roll back.
pub async fn ingest_batch(db: &Db, batch: RawBatch) -> Result<IngestSummary, IngestError> {
    if batch.movies.is_empty() {
        return Err(IngestError::EmptyBatch);
    }

    // Processing: reference resolution happens up front so the terminal
    // transaction holds the write lock only for the movie inserts.
    let mut queued: Vec<ResolvedMovie> = Vec::with_capacity(batch.movies.len());
    for entry in &batch.movies {
        let rec = record::normalize(entry)?;

        let country_id = resolve(db, RefKind::Country, &rec.country).await?;
        let mut genre_ids = Vec::with_capacity(rec.genres.len());
        for name in &rec.genres {
            genre_ids.push(resolve(db, RefKind::Genre, name).await?);
        }
        let mut actor_ids = Vec::with_capacity(rec.actors.len());
        for name in &rec.actors {
            actor_ids.push(resolve(db, RefKind::Actor, name).await?);
        }

        queued.push(ResolvedMovie {
            record: rec,
            country_id,
            genre_ids,
            actor_ids,
        });
    }

    // Committing: all movie inserts share one terminal commit. Dropping the
    // transaction on an early return rolls everything back.
    let mut tx = db.pool.begin().await.map_err(classify_db)?;
    for movie in &queued {
        if let Err(e) = writer::insert_movie(&mut tx, movie).await {
            warn!(title = ?movie.record.title, error = %e, "movie insert failed; batch rolls back");
            return Err(classify_db(e));
        }
    }
    tx.commit().await.map_err(classify_db)?;

    let inserted = queued.len();
    info!(inserted, "movie batch committed");
    Ok(IngestSummary {
        inserted_count: inserted,
    })
}
