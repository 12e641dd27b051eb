mod common;

use axum::http::StatusCode;
use common::{get, post_json, post_raw, send};
use leadsite::test_utils::test_helpers;
use serde_json::json;

#[tokio::test]
async fn test_contact_form_is_acknowledged() {
    let (app, repository) = test_helpers::test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/api/contact",
            json!({
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "company": "Navy",
                "service": "consulting",
                "message": "Line one\nLine two",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Your message has been submitted. We will review and respond soon."
    );
    // Contact submissions never create leads.
    assert!(repository.is_empty());
}

#[tokio::test]
async fn test_contact_form_optional_fields_may_be_omitted() {
    let (app, _repository) = test_helpers::test_app();

    let (status, _) = send(
        &app,
        post_json(
            "/api/contact",
            json!({
                "name": "Grace",
                "email": "grace@example.com",
                "message": "Hello",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contact_form_requires_name_email_and_message() {
    let (app, _repository) = test_helpers::test_app();

    let cases = [
        json!({ "email": "grace@example.com", "message": "Hello" }),
        json!({ "name": "Grace", "message": "Hello" }),
        json!({ "name": "Grace", "email": "grace@example.com" }),
        json!({ "name": "Grace", "email": "grace@example.com", "message": "   " }),
    ];

    for case in cases {
        let (status, body) = send(&app, post_json("/api/contact", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "for {case}");
        assert_eq!(body["error"], "Name, email, and message are required");
    }
}

#[tokio::test]
async fn test_contact_form_malformed_json() {
    let (app, _repository) = test_helpers::test_app();

    let (status, body) = send(&app, post_raw("/api/contact", "name=grace")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_contact_only_accepts_post() {
    let (app, _repository) = test_helpers::test_app();

    let (status, _) = send(&app, get("/api/contact")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
