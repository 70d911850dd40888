use anyhow::{Context, Result};
use reelrank::api::ApiServer;
use reelrank::db::Db;
use reelrank::util::env as env_util;

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    reelrank::tracing::init_tracing("info,sqlx=warn")?;

    let database_url = env_util::db_url();
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&database_url, max_conns)
        .await
        .context("Db::connect failed")?;

    ApiServer::from_env()?.run(db).await
}
