// HTTP surface for the movie catalog. Thin dispatch over the catalog
// repository and the ingestion pipeline.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
