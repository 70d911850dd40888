// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::api::server::ApiConfig;
use crate::db::Db;
use crate::ingest::{self, IngestError, RawBatch, RefKind};
use actix_web::{web, HttpResponse, Result};
use std::time::SystemTime;

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Map an ingestion failure onto a response with a classified reason string.
fn ingest_error_response(err: &IngestError) -> HttpResponse {
    let body = ApiResponse::<()>::error(err.to_string());
    match err {
        IngestError::SourceUnavailable(_) => HttpResponse::NotFound().json(body),
        IngestError::SourceMalformed(_)
        | IngestError::EmptyBatch
        | IngestError::MalformedRecord(_) => HttpResponse::BadRequest().json(body),
        IngestError::IntegrityConflict(_) => HttpResponse::Conflict().json(body),
        IngestError::Failure(_) => HttpResponse::InternalServerError().json(body),
    }
}

fn internal_error(err: anyhow::Error) -> HttpResponse {
    tracing::error!(error = %err, "catalog query failed");
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error(err.to_string()))
}

/// Fetch up to five movies for a country; when the country is absent, the
/// source file is ingested once before the lookup is retried.
pub async fn movies_by_country(
    path: web::Path<String>,
    db: web::Data<Db>,
    config: web::Data<ApiConfig>,
) -> Result<HttpResponse> {
    let country_name = path.into_inner();

    match db
        .movies_by_country_or_ingest(&country_name, &config.source_path)
        .await
    {
        Ok(movies) if movies.is_empty() => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error(format!(
                "no movies found for country: {country_name}"
            ))))
        }
        Ok(movies) => Ok(HttpResponse::Ok().json(ApiResponse::success(movies))),
        Err(e) => {
            tracing::warn!(country = %country_name, error = %e, "country lookup failed");
            Ok(ingest_error_response(&e))
        }
    }
}

/// Bulk-insert movies from a JSON request body.
pub async fn bulk_insert(payload: web::Json<RawBatch>, db: web::Data<Db>) -> Result<HttpResponse> {
    match ingest::ingest_batch(&db, payload.into_inner()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => {
            tracing::warn!(error = %e, "bulk insert failed");
            Ok(ingest_error_response(&e))
        }
    }
}

/// Trigger ingestion from the configured source file.
pub async fn ingest_source_file(
    db: web::Data<Db>,
    config: web::Data<ApiConfig>,
) -> Result<HttpResponse> {
    match ingest::ingest_file(&db, &config.source_path).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => {
            tracing::warn!(path = %config.source_path.display(), error = %e, "file ingestion failed");
            Ok(ingest_error_response(&e))
        }
    }
}

pub async fn list_movies(query: web::Query<PageQuery>, db: web::Data<Db>) -> Result<HttpResponse> {
    match db.list_movies(query.skip, query.limit).await {
        Ok(movies) => Ok(HttpResponse::Ok().json(ApiResponse::success(movies))),
        Err(e) => Ok(internal_error(e)),
    }
}

pub async fn get_movie(path: web::Path<i64>, db: web::Data<Db>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match db.movie_by_id(id).await {
        Ok(Some(movie)) => Ok(HttpResponse::Ok().json(ApiResponse::success(movie))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("no movie with id {id}")))),
        Err(e) => Ok(internal_error(e)),
    }
}

pub async fn delete_movie(path: web::Path<i64>, db: web::Data<Db>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match db.delete_movie(id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
            "deleted": id
        })))),
        Ok(false) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("no movie with id {id}")))),
        Err(e) => Ok(internal_error(e)),
    }
}

async fn list_named(kind: RefKind, query: PageQuery, db: &Db) -> HttpResponse {
    match db.list_named(kind, query.skip, query.limit).await {
        Ok(rows) => HttpResponse::Ok().json(ApiResponse::success(rows)),
        Err(e) => internal_error(e),
    }
}

pub async fn list_countries(
    query: web::Query<PageQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    Ok(list_named(RefKind::Country, query.into_inner(), &db).await)
}

pub async fn list_genres(query: web::Query<PageQuery>, db: web::Data<Db>) -> Result<HttpResponse> {
    Ok(list_named(RefKind::Genre, query.into_inner(), &db).await)
}

pub async fn list_actors(query: web::Query<PageQuery>, db: web::Data<Db>) -> Result<HttpResponse> {
    Ok(list_named(RefKind::Actor, query.into_inner(), &db).await)
}

pub async fn rankings_by_country(
    path: web::Path<String>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    match db.rankings_by_country(&path.into_inner()).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(ApiResponse::success(rows))),
        Err(e) => Ok(internal_error(e)),
    }
}
