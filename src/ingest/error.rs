use thiserror::Error;

/// Classified ingestion failures. Any record-level or commit-level failure
/// aborts the batch; the API layer translates these into response statuses.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("source malformed: {0}")]
    SourceMalformed(#[source] serde_json::Error),

    #[error("no movie entries in batch")]
    EmptyBatch,

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("integrity conflict: {0}")]
    IntegrityConflict(#[source] sqlx::Error),

    #[error("ingestion failed: {0}")]
    Failure(anyhow::Error),
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        IngestError::Failure(err)
    }
}

/// Map a database error into the taxonomy: constraint violations are
/// integrity conflicts, everything else is the catch-all failure.
pub fn classify_db(err: sqlx::Error) -> IngestError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return IngestError::IntegrityConflict(err);
        }
    }
    IngestError::Failure(err.into())
}
