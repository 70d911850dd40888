//! Catalog ingestion pipeline: normalize raw scraped records, resolve
//! country/genre/actor references by natural key, and commit movie rows as an
//! all-or-nothing batch.
//!
//! Reference rows commit eagerly (each resolution is durable immediately);
//! movie inserts share one terminal transaction. The asymmetry means
//! reference data can survive a batch that later aborts.

pub mod batch;
pub mod error;
pub mod record;
pub mod resolve;
pub mod writer;

pub use batch::{ingest_batch, ingest_file, IngestSummary};
pub use error::IngestError;
pub use record::{normalize, NormalizedRecord, RawBatch, RawEntry};
pub use resolve::{resolve, RefKind};
