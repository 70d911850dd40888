use sqlx::{Row, Sqlite, Transaction};

use super::record::NormalizedRecord;

/// A normalized record with every reference already resolved to an id.
/// Queued by the batch coordinator; durable only once the batch commits.
#[derive(Debug)]
pub struct ResolvedMovie {
    pub record: NormalizedRecord,
    pub country_id: i64,
    pub genre_ids: Vec<i64>,
    pub actor_ids: Vec<i64>,
}

/// Insert one movie, its genre/actor links, and its ranking row (when the
/// entry carried a rank) inside the batch transaction. No dedup against
/// existing movies by title: duplicate titles are distinct rows.
pub async fn insert_movie(
    tx: &mut Transaction<'_, Sqlite>,
    movie: &ResolvedMovie,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO movies (title, release_year, score, summary, image_url, country_id)
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&movie.record.title)
    .bind(&movie.record.release_year)
    .bind(movie.record.score)
    .bind(&movie.record.summary)
    .bind(&movie.record.image_url)
    .bind(movie.country_id)
    .fetch_one(&mut **tx)
    .await?;
    let movie_id: i64 = row.get("id");

    for genre_id in &movie.genre_ids {
        sqlx::query("INSERT INTO movie_genre (movie_id, genre_id) VALUES (?, ?)")
            .bind(movie_id)
            .bind(genre_id)
            .execute(&mut **tx)
            .await?;
    }
    for actor_id in &movie.actor_ids {
        sqlx::query("INSERT INTO movie_actor (movie_id, actor_id) VALUES (?, ?)")
            .bind(movie_id)
            .bind(actor_id)
            .execute(&mut **tx)
            .await?;
    }

    if let Some(rank) = movie.record.rank {
        sqlx::query("INSERT INTO rankings (country_id, movie_id, rank) VALUES (?, ?, ?)")
            .bind(movie.country_id)
            .bind(movie_id)
            .bind(rank)
            .execute(&mut **tx)
            .await?;
    }

    Ok(movie_id)
}
