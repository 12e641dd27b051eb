use leadsite::{
    config::AppConfig,
    db,
    logging::{self, LogBuffer},
    repositories::PgUserRepository,
    routes::{build_router, RouterOptions},
    AppState,
};

use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Console output plus the buffer behind /api/debug
    let log_buffer = LogBuffer::default();
    logging::init_tracing(log_buffer.clone());

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, "Starting leadsite");

    // Database connection (lazy) and schema, off the startup path
    let pool = db::create_pool(&config.database)?;
    db::spawn_schema_init(pool.clone());

    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let app_state = AppState::new(user_repository, log_buffer);

    let app = build_router(app_state, &RouterOptions::from(&config));

    let addr = SocketAddr::from((config.server.host, config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::close_pool(&pool).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
