//! Postgres connection pool + schema migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect to Postgres and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    Ok(pool)
}
