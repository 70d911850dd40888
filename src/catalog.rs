//! Typed catalog queries on the [`Db`] handle. Relationship traversal is
//! explicit: every fetch is a named query, there is no lazy loading.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};

use crate::db::Db;
use crate::ingest::{self, IngestError, RefKind};

/// Per-country lookups return at most this many movies.
pub const MOVIES_PER_COUNTRY: i64 = 5;

/// Upper bound for paged listings.
pub const MAX_PAGE_SIZE: i64 = 500;

// SQLite treats a negative LIMIT as unbounded, so paging inputs are clamped
// before they reach a bind.
fn clamp_page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(0, MAX_PAGE_SIZE))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub title: Option<String>,
    pub release_year: Option<String>,
    pub score: f64,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub country_id: i64,
}

/// Movie row joined with its genre and actor names.
#[derive(Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: MovieRow,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RankingRow {
    pub id: i64,
    pub rank: Option<i64>,
    pub country_id: Option<i64>,
    pub movie_id: Option<i64>,
}

impl Db {
    pub async fn country_by_name(&self, name: &str) -> Result<Option<NamedRow>> {
        let row = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM countries WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Up to [`MOVIES_PER_COUNTRY`] movies for a country, by natural key.
    pub async fn movies_by_country(&self, name: &str) -> Result<Vec<MovieDetail>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT m.id, m.title, m.release_year, m.score, m.summary, m.image_url, m.country_id
             FROM movies m
             JOIN countries c ON c.id = m.country_id
             WHERE c.name = ?
             ORDER BY m.id
             LIMIT ?",
        )
        .bind(name)
        .bind(MOVIES_PER_COUNTRY)
        .fetch_all(&self.pool)
        .await?;

        let mut detailed = Vec::with_capacity(rows.len());
        for movie in rows {
            let genres = self.names_for_movie(movie.id, RefKind::Genre).await?;
            let actors = self.names_for_movie(movie.id, RefKind::Actor).await?;
            detailed.push(MovieDetail {
                movie,
                genres,
                actors,
            });
        }
        Ok(detailed)
    }

    async fn names_for_movie(&self, movie_id: i64, kind: RefKind) -> Result<Vec<String>> {
        let (join_table, join_col) = match kind {
            RefKind::Genre => ("movie_genre", "genre_id"),
            RefKind::Actor => ("movie_actor", "actor_id"),
            RefKind::Country => anyhow::bail!("countries are not joined through a link table"),
        };
        let sql = format!(
            "SELECT r.name FROM {table} r
             JOIN {join_table} j ON j.{join_col} = r.id
             WHERE j.movie_id = ?
             ORDER BY r.name",
            table = kind.table(),
        );
        let names = sqlx::query_scalar::<_, String>(&sql)
            .bind(movie_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Documented fallback-then-retry: when the country is absent, run the
    /// file ingestion once and retry the lookup exactly once.
    #[instrument(skip(self, source))]
    pub async fn movies_by_country_or_ingest(
        &self,
        name: &str,
        source: &Path,
    ) -> Result<Vec<MovieDetail>, IngestError> {
        if self
            .country_by_name(name)
            .await
            .map_err(IngestError::Failure)?
            .is_none()
        {
            info!(country = name, "country absent; triggering source ingestion");
            ingest::ingest_file(self, source).await?;
        }
        self.movies_by_country(name)
            .await
            .map_err(IngestError::Failure)
    }

    pub async fn movie_by_id(&self, id: i64) -> Result<Option<MovieDetail>> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, release_year, score, summary, image_url, country_id
             FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(movie) => {
                let genres = self.names_for_movie(movie.id, RefKind::Genre).await?;
                let actors = self.names_for_movie(movie.id, RefKind::Actor).await?;
                Ok(Some(MovieDetail {
                    movie,
                    genres,
                    actors,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn list_movies(&self, skip: i64, limit: i64) -> Result<Vec<MovieRow>> {
        let (skip, limit) = clamp_page(skip, limit);
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, release_year, score, summary, image_url, country_id
             FROM movies ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Delete a movie; join and ranking rows go with it via cascade.
    /// Returns false when no such movie existed.
    pub async fn delete_movie(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Paged listing for countries/genres/actors.
    pub async fn list_named(&self, kind: RefKind, skip: i64, limit: i64) -> Result<Vec<NamedRow>> {
        let (skip, limit) = clamp_page(skip, limit);
        let sql = format!(
            "SELECT id, name FROM {} ORDER BY id LIMIT ? OFFSET ?",
            kind.table()
        );
        let rows = sqlx::query_as::<_, NamedRow>(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn rankings_by_country(&self, name: &str) -> Result<Vec<RankingRow>> {
        let rows = sqlx::query_as::<_, RankingRow>(
            "SELECT r.id, r.rank, r.country_id, r.movie_id
             FROM rankings r
             JOIN countries c ON c.id = r.country_id
             WHERE c.name = ?
             ORDER BY r.rank",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_db() -> Db {
        Db::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn batch_with_movies(country: &str, n: usize) -> crate::ingest::RawBatch {
        let movies: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "country": country,
                    "movie": {"title": format!("Movie {i}"), "score": 5.0},
                    "rank": i as i64 + 1
                })
            })
            .collect();
        serde_json::from_value(json!({ "movies": movies })).unwrap()
    }

    fn write_source(doc: &serde_json::Value) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("reelrank-src-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(doc).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn country_lookup_caps_at_five() {
        let db = test_db().await;
        crate::ingest::ingest_batch(&db, batch_with_movies("US", 7))
            .await
            .unwrap();

        let movies = db.movies_by_country("US").await.unwrap();
        assert_eq!(movies.len(), 5);
    }

    #[tokio::test]
    async fn absent_country_triggers_one_ingestion_then_retry() {
        let db = test_db().await;
        let doc = json!({
            "movies": [{
                "country": "South Korea",
                "movie": {"title": "A", "release_year": "2020", "score": "null",
                          "summary": "s", "image_url": "u",
                          "genres": ["Drama"], "actors": ["X"]},
                "rank": 1
            }]
        });
        let path = write_source(&doc);

        let movies = db
            .movies_by_country_or_ingest("South Korea", &path)
            .await
            .unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].movie.title.as_deref(), Some("A"));
        assert_eq!(movies[0].movie.score, 0.0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn known_country_does_not_reingest() {
        let db = test_db().await;
        crate::ingest::ingest_batch(&db, batch_with_movies("US", 1))
            .await
            .unwrap();

        // The source path does not exist; the lookup must not touch it
        // because the country is already present.
        let movies = db
            .movies_by_country_or_ingest("US", Path::new("/nonexistent/movies.json"))
            .await
            .unwrap();
        assert_eq!(movies.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_movie_cascades_to_rankings_and_links() {
        let db = test_db().await;
        let doc: crate::ingest::RawBatch = serde_json::from_value(json!({
            "movies": [{
                "country": "US",
                "movie": {"title": "A", "genres": ["Drama"], "actors": ["X"]},
                "rank": 1
            }]
        }))
        .unwrap();
        crate::ingest::ingest_batch(&db, doc).await.unwrap();

        let movie_id: i64 = sqlx::query_scalar("SELECT id FROM movies LIMIT 1")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert!(db.delete_movie(movie_id).await.unwrap());

        for table in ["rankings", "movie_genre", "movie_actor"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&db.pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{table} should be empty after cascade");
        }
    }

    #[tokio::test]
    async fn delete_missing_movie_returns_false() {
        let db = test_db().await;
        assert!(!db.delete_movie(42).await.unwrap());
    }

    #[tokio::test]
    async fn paged_listing_respects_skip_and_limit() {
        let db = test_db().await;
        crate::ingest::ingest_batch(&db, batch_with_movies("US", 4))
            .await
            .unwrap();

        let page = db.list_movies(1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title.as_deref(), Some("Movie 1"));
    }

    #[tokio::test]
    async fn negative_paging_inputs_are_clamped() {
        let db = test_db().await;
        crate::ingest::ingest_batch(&db, batch_with_movies("US", 3))
            .await
            .unwrap();

        // A negative limit must not become SQLite's unbounded LIMIT -1.
        let rows = db.list_movies(0, -1).await.unwrap();
        assert!(rows.is_empty());

        let rows = db.list_movies(-5, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title.as_deref(), Some("Movie 0"));

        let named = db.list_named(RefKind::Country, 0, -1).await.unwrap();
        assert!(named.is_empty());
    }

    #[tokio::test]
    async fn rankings_come_back_in_rank_order() {
        let db = test_db().await;
        crate::ingest::ingest_batch(&db, batch_with_movies("US", 3))
            .await
            .unwrap();

        let rankings = db.rankings_by_country("US").await.unwrap();
        let ranks: Vec<_> = rankings.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
    }
}
