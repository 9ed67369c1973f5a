use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::AppError;

/// Connects the Postgres pool and runs pending migrations.
pub async fn init_db() -> Result<PgPool, AppError> {
    let database_url = std::env::var("DATABASE_URL").map_err(|e| {
        AppError::Unexpected(anyhow::anyhow!(e).context("DATABASE_URL Env must be set"))
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Postgres: {:?}", e);
            AppError::Database(anyhow::Error::new(e).context("Failed to connect to Postgres"))
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {:?}", e);
        AppError::Database(anyhow::Error::new(e).context("Failed to run database migrations"))
    })?;

    tracing::info!("Database connected and migrated successfully");
    Ok(pool)
}
