use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

/// Explicitly constructed database handle, passed down to the API and the
/// ingestion pipeline. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        // An in-memory SQLite database exists per connection; pin the pool to
        // a single long-lived connection so every acquire observes the same
        // database. File-backed databases get WAL and the full pool.
        let in_memory = database_url.contains(":memory:");

        let mut connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(10));
        if !in_memory {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections })
            .acquire_timeout(Duration::from_secs(10));
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(connect_options).await?;
        info!("connected to db");

        Self::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    // Create-on-boot schema; every statement is IF NOT EXISTS so reconnecting
    // against an existing database is a no-op.
    async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(pool).await?;
        info!("schema ensured");
        Ok(())
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS countries (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS genres (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS actors (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS movies (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT,
    release_year TEXT,
    score        REAL NOT NULL DEFAULT 0,
    summary      TEXT,
    image_url    TEXT,
    country_id   INTEGER NOT NULL REFERENCES countries(id)
);

CREATE TABLE IF NOT EXISTS movie_genre (
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (movie_id, genre_id)
);

CREATE TABLE IF NOT EXISTS movie_actor (
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    actor_id INTEGER NOT NULL REFERENCES actors(id) ON DELETE CASCADE,
    PRIMARY KEY (movie_id, actor_id)
);

CREATE TABLE IF NOT EXISTS rankings (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    country_id INTEGER REFERENCES countries(id) ON DELETE CASCADE,
    movie_id   INTEGER REFERENCES movies(id) ON DELETE CASCADE,
    rank       INTEGER
);

CREATE INDEX IF NOT EXISTS idx_movies_country ON movies(country_id);
CREATE INDEX IF NOT EXISTS idx_rankings_country ON rankings(country_id);
";
