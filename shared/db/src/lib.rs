use shared_error::ApiError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Initialize the database connection pool
///
/// Bounds: 25 open connections, 10 kept idle, 5-minute lifetime. The pool is
/// the only database-shaped global; everything else borrows from it per
/// request.
pub async fn init_pool(database_url: &str) -> Result<PgPool, ApiError> {
    PgPoolOptions::new()
        .max_connections(25)
        .min_connections(10)
        .max_lifetime(Duration::from_secs(300))
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| ApiError::internal(format!("failed to connect to database: {}", e)))
}

/// Readiness probe: one round trip to the database
pub async fn ping(pool: &PgPool) -> Result<(), ApiError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            tracing::warn!(error = %e, "database ping failed");
            ApiError::internal(format!("database unreachable: {}", e))
        })
}
