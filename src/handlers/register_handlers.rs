use crate::{
    error::{AppError, Result},
    models::user::{UserListing, UserSummary},
    services::lead_service::{LeadServiceError, ListQuery, RegistrationRequest},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const REGISTRATION_FAILED: &str = "Internal server error. Please try again later.";
const LISTING_FAILED: &str = "Failed to retrieve registrations";

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub search: Option<String>,
    pub company: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub users: Vec<UserListing>,
    pub total: i64,
    pub returned: usize,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
    pub user_id: i64,
}

/// `POST /api/register`
pub async fn register_user(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>> {
    let Json(request) = payload?;
    info!("User registration request received");

    match app_state.lead_service.register(request).await {
        Ok(user) => {
            info!(
                user_id = user.id,
                email = %user.email,
                company = %user.company,
                "User registration successful"
            );

            Ok(Json(RegisterResponse {
                success: true,
                message: "Registration successful! We will contact you within 24 hours.",
                user: UserSummary::from(&user),
            }))
        }
        Err(e) => {
            match &e {
                LeadServiceError::MissingFields => {
                    warn!("Registration validation failed - missing required fields")
                }
                LeadServiceError::EmailTaken => warn!("Registration failed - email already exists"),
                _ => {}
            }
            Err(AppError::from_lead_error(e, REGISTRATION_FAILED))
        }
    }
}

/// `GET /api/register`
pub async fn list_registrations(
    State(app_state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>> {
    let Query(params) = params?;
    info!(
        limit = ?params.limit,
        offset = ?params.offset,
        search = ?params.search,
        company = ?params.company,
        "Registration list requested"
    );

    let query = ListQuery {
        limit: parse_count("limit", params.limit.as_deref(), 1)?,
        offset: parse_count("offset", params.offset.as_deref(), 0)?,
        search: params.search,
        company: params.company,
    };

    let page = app_state
        .lead_service
        .list(query)
        .await
        .map_err(|e| AppError::from_lead_error(e, LISTING_FAILED))?;

    Ok(Json(ListResponse {
        returned: page.users.len(),
        users: page.users.iter().map(UserListing::from).collect(),
        total: page.total,
    }))
}

/// `DELETE /api/register?id=`
pub async fn delete_registration(
    State(app_state): State<AppState>,
    params: std::result::Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<DeleteResponse>> {
    let Query(params) = params?;

    let raw_id = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?;
    let user_id = raw_id
        .parse::<i64>()
        .map_err(|_| AppError::Validation("Invalid user ID".to_string()))?;

    info!(user_id, "User deletion requested");

    match app_state.lead_service.delete(user_id).await {
        Ok(()) => {
            info!(user_id, "User deleted successfully");
            Ok(Json(DeleteResponse {
                success: true,
                message: "User deleted successfully",
                user_id,
            }))
        }
        Err(e) => {
            if matches!(e, LeadServiceError::UserNotFound) {
                warn!(user_id, "User deletion failed - user not found");
            }
            Err(AppError::from_lead_error(e, REGISTRATION_FAILED))
        }
    }
}

/// Optional numeric query parameter; blank means absent.
fn parse_count(name: &str, raw: Option<&str>, min: u32) -> Result<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<u32>() {
        Ok(value) if value >= min => Ok(Some(value)),
        _ => Err(AppError::Validation(format!(
            "{name} must be an integer of at least {min}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_accepts_blank_as_absent() {
        assert_eq!(parse_count("limit", None, 1).unwrap(), None);
        assert_eq!(parse_count("limit", Some("  "), 1).unwrap(), None);
    }

    #[test]
    fn parse_count_enforces_minimum() {
        assert_eq!(parse_count("limit", Some("10"), 1).unwrap(), Some(10));
        assert_eq!(parse_count("offset", Some("0"), 0).unwrap(), Some(0));
        assert!(parse_count("limit", Some("0"), 1).is_err());
        assert!(parse_count("limit", Some("-1"), 1).is_err());
        assert!(parse_count("limit", Some("ten"), 1).is_err());
    }
}
