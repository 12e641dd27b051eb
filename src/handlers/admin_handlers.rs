use crate::{
    error::{AppError, Result},
    models::user::UserSummary,
    services::lead_service::{HealthReport, LeadServiceError},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

const ADMIN_ACTION_FAILED: &str = "Database admin action failed";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RecentArgs {
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    search_term: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    user_id: Option<i64>,
}

/// `GET /api/admin/database`. Always answers 200; store failures are
/// reported in the body.
pub async fn database_health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    info!("Database health check requested");

    Json(HealthResponse {
        report: app_state.lead_service.health().await,
        timestamp: Utc::now(),
    })
}

/// `POST /api/admin/database`, dispatching on the `action` field.
pub async fn database_action(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;
    let action = body.get("action").and_then(Value::as_str).unwrap_or("");

    info!(action, "Database admin action requested");

    let service = &app_state.lead_service;
    let fail = |e: LeadServiceError| AppError::from_lead_error(e, ADMIN_ACTION_FAILED);

    let response = match action {
        "stats" => {
            let stats = service.stats().await.map_err(fail)?;
            json!({
                "totalUsers": stats.total,
                "recentUsers": stats.last_30_days,
                "stats": {
                    "total": stats.total,
                    "last30Days": stats.last_30_days,
                    "averagePerDay": stats.average_per_day,
                },
            })
        }
        "recent" => {
            let args: RecentArgs = action_args(action, &body)?;
            let (days, users) = service.recent(args.days).await.map_err(fail)?;
            json!({
                "users": summaries(&users),
                "count": users.len(),
                "days": days,
            })
        }
        "search" => {
            let args: SearchArgs = action_args(action, &body)?;
            let search_term = args.search_term.unwrap_or_default();
            let users = service.search(&search_term).await.map_err(fail)?;
            json!({
                "users": summaries(&users),
                "count": users.len(),
                "searchTerm": search_term,
            })
        }
        "companies" => {
            let companies = service.companies().await.map_err(fail)?;
            json!({
                "totalCompanies": companies.len(),
                "companies": companies,
            })
        }
        "delete" => {
            let args: DeleteArgs = action_args(action, &body)?;
            let user_id = args
                .user_id
                .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?;
            service.delete(user_id).await.map_err(fail)?;
            info!(user_id, "User deleted by admin action");
            json!({
                "success": true,
                "message": "User deleted successfully",
                "userId": user_id,
            })
        }
        _ => {
            warn!(action, "Unknown database admin action");
            return Err(AppError::Validation("Invalid action".to_string()));
        }
    };

    Ok(Json(response))
}

fn action_args<T: DeserializeOwned>(action: &str, body: &Value) -> Result<T> {
    serde_json::from_value(body.clone())
        .map_err(|_| AppError::Validation(format!("Invalid arguments for action '{action}'")))
}

fn summaries(users: &[crate::models::User]) -> Vec<UserSummary> {
    users.iter().map(UserSummary::from).collect()
}
