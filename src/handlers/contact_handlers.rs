use crate::{
    error::Result,
    services::contact_service::{ContactRequest, CONTACT_ACKNOWLEDGEMENT},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/contact`
pub async fn submit_contact_form(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    let Json(request) = payload?;

    app_state.contact_service.submit(request)?;

    Ok(Json(ContactResponse {
        success: true,
        message: CONTACT_ACKNOWLEDGEMENT,
    }))
}
