// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // Fixed segments must be registered before /movies/{country_name}.
        .route("/movies/bulk_insert", web::post().to(handlers::bulk_insert))
        .route("/movies/id/{id}", web::get().to(handlers::get_movie))
        .route("/movies/id/{id}", web::delete().to(handlers::delete_movie))
        .route("/movies", web::get().to(handlers::list_movies))
        .route(
            "/movies/{country_name}",
            web::get().to(handlers::movies_by_country),
        )
        .route(
            "/ingest/file",
            web::post().to(handlers::ingest_source_file),
        )
        .route("/countries", web::get().to(handlers::list_countries))
        .route("/genres", web::get().to(handlers::list_genres))
        .route("/actors", web::get().to(handlers::list_actors))
        .route(
            "/rankings/{country_name}",
            web::get().to(handlers::rankings_by_country),
        );
}
