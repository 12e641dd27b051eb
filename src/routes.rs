use std::path::PathBuf;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::Span;

use crate::{config::AppConfig, handlers, AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Directory served for every path not matched by the API.
    pub static_dir: Option<PathBuf>,
    pub debug_endpoints: bool,
    pub production: bool,
}

impl From<&AppConfig> for RouterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            static_dir: Some(config.static_dir.clone()),
            debug_endpoints: config.debug_endpoints,
            production: config.environment.is_production(),
        }
    }
}

pub fn build_router(app_state: AppState, options: &RouterOptions) -> Router {
    let mut app = Router::new()
        .route(
            "/api/register",
            post(handlers::register_user)
                .get(handlers::list_registrations)
                .delete(handlers::delete_registration),
        )
        .route("/api/contact", post(handlers::submit_contact_form))
        .route(
            "/api/admin/database",
            get(handlers::database_health).post(handlers::database_action),
        );

    if options.debug_endpoints {
        app = app.route(
            "/api/debug",
            get(handlers::get_server_logs).delete(handlers::clear_server_logs),
        );
    }

    if let Some(dir) = &options.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    app.layer(middleware::from_fn_with_state(
        options.production,
        add_security_headers,
    ))
    .layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::new(request_id)),
    )
    .with_state(app_state)
}

/// The fields recorded here are what the log buffer attaches to each entry.
fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

async fn add_security_headers(
    State(production): State<bool>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if production {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
