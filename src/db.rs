pub mod schema;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::database::{
    DatabaseConfig, ACQUIRE_TIMEOUT, IDLE_TIMEOUT, MAX_CONNECTIONS, MIN_CONNECTIONS,
};

pub use schema::{ensure_schema, spawn_schema_init};

/// Builds the shared connection pool.
///
/// The pool is lazy: no connection is opened until the first query, so this
/// only fails when the connection string itself is malformed.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = config.connect_options()?;

    tracing::info!(
        url = %config.masked_url(),
        max_connections = MAX_CONNECTIONS,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .idle_timeout(IDLE_TIMEOUT)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy_with(options);

    Ok(pool)
}

pub async fn close_pool(pool: &PgPool) {
    pool.close().await;
    tracing::info!("Database connection pool closed");
}
