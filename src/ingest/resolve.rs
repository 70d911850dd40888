use sqlx::Row;
use tracing::debug;

use super::error::{classify_db, IngestError};
use crate::db::Db;

/// The three reference categories resolved by natural key during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Country,
    Genre,
    Actor,
}

impl RefKind {
    pub fn table(self) -> &'static str {
        match self {
            RefKind::Country => "countries",
            RefKind::Genre => "genres",
            RefKind::Actor => "actors",
        }
    }
}

/// Lookup-or-create a reference row by name, returning its id.
///
/// Insert first with ON CONFLICT DO NOTHING so two racing resolutions for the
/// same (kind, name) never both create a row; the loser re-reads the winner's
/// committed id. Runs on the pool in autocommit, so each resolution is
/// durable immediately and visible to subsequent resolutions in the batch.
pub async fn resolve(db: &Db, kind: RefKind, name: &str) -> Result<i64, IngestError> {
    let insert = format!(
        "INSERT INTO {} (name) VALUES (?) ON CONFLICT(name) DO NOTHING RETURNING id",
        kind.table()
    );
    if let Some(row) = sqlx::query(&insert)
        .bind(name)
        .fetch_optional(&db.pool)
        .await
        .map_err(classify_db)?
    {
        let id: i64 = row.get("id");
        debug!(kind = ?kind, name, id, "reference created");
        return Ok(id);
    }

    // Insert returned nothing: the row already exists, fetch its id.
    let select = format!("SELECT id FROM {} WHERE name = ?", kind.table());
    let row = sqlx::query(&select)
        .bind(name)
        .fetch_one(&db.pool)
        .await
        .map_err(classify_db)?;
    Ok(row.get("id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Db {
        Db::connect("sqlite::memory:", 1).await.unwrap()
    }

    #[tokio::test]
    async fn resolving_twice_returns_same_id() {
        let db = test_db().await;

        let first = resolve(&db, RefKind::Genre, "Drama").await.unwrap();
        let second = resolve(&db, RefKind::Genre, "Drama").await.unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres WHERE name = 'Drama'")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn categories_do_not_collide() {
        let db = test_db().await;

        let genre_id = resolve(&db, RefKind::Genre, "Drama").await.unwrap();
        let actor_id = resolve(&db, RefKind::Actor, "Drama").await.unwrap();

        // Same name in different categories lives in different tables.
        let genres: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        let actors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actors")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!((genres, actors), (1, 1));
        assert_eq!(genre_id, 1);
        assert_eq!(actor_id, 1);
    }

    #[tokio::test]
    async fn distinct_names_get_distinct_ids() {
        let db = test_db().await;

        let kr = resolve(&db, RefKind::Country, "South Korea").await.unwrap();
        let us = resolve(&db, RefKind::Country, "US").await.unwrap();
        assert_ne!(kr, us);
    }
}
