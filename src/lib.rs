pub mod api;
pub mod catalog;
pub mod db;
pub mod ingest;
pub mod tracing;

pub mod util {
    pub mod env;
}
