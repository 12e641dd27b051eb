use crate::AppState;
use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /api/debug`: recent server log entries, newest first.
pub async fn get_server_logs(State(app_state): State<AppState>) -> Json<Value> {
    let logs = app_state.log_buffer.entries();

    Json(json!({
        "totalLogs": logs.len(),
        "logs": logs,
        "timestamp": Utc::now(),
    }))
}

/// `DELETE /api/debug`
pub async fn clear_server_logs(State(app_state): State<AppState>) -> Json<Value> {
    app_state.log_buffer.clear();
    tracing::info!("Server logs cleared");

    Json(json!({
        "message": "Server logs cleared",
        "timestamp": Utc::now(),
    }))
}
