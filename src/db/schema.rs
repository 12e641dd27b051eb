use sqlx::PgPool;
use tokio::task::JoinHandle;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE CHECK (email = LOWER(BTRIM(email))),
    company VARCHAR(255) NOT NULL,
    phone VARCHAR(50) NOT NULL,
    message TEXT NOT NULL DEFAULT '',
    email_sent BOOLEAN NOT NULL DEFAULT FALSE,
    email_sent_at TIMESTAMPTZ,
    email_message_id VARCHAR(255),
    admin_notification_sent BOOLEAN NOT NULL DEFAULT FALSE,
    admin_notification_sent_at TIMESTAMPTZ,
    admin_notification_message_id VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_EMAIL_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at)";

/// Creates the `users` table and its indexes if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_USERS_TABLE, CREATE_EMAIL_INDEX, CREATE_CREATED_AT_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema initialized");
    Ok(())
}

/// Runs [`ensure_schema`] in the background. A failure is only logged; the
/// first query against a missing table reports the error to its caller.
pub fn spawn_schema_init(pool: PgPool) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = ensure_schema(&pool).await {
            tracing::warn!(error = %e, "Database initialization deferred");
        }
    })
}
