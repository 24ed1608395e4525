//! Axum adapter for the relay's HTTP contract.
//!
//! ```rust,ignore
//! let relay = Arc::new(MailRelay::new(RelayConfig::from_env()?)?);
//! let app = contact_relay::server::router(relay);
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::handler::{self, ApiRequest, ApiResponse};
use crate::relay::MailRelay;

/// Path of the contact endpoint.
pub const SEND_EMAIL_PATH: &str = "/api/send-email";

/// Shared state for routes.
#[derive(Clone)]
struct AppState {
    relay: Arc<MailRelay>,
}

/// Create the API router.
pub fn router(relay: Arc<MailRelay>) -> Router {
    let state = AppState { relay };

    Router::new()
        .route(SEND_EMAIL_PATH, any(send_email))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any method on /api/send-email; the handler answers 405 itself.
async fn send_email(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = ApiRequest {
        method: method.to_string(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: body.to_vec(),
    };

    into_axum(handler::handle(&state.relay, request).await)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Any other route.
async fn not_found(method: Method, uri: Uri) -> Response {
    let body = json!({
        "success": false,
        "error": format!("Route {} {} not found", method, uri.path()),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn into_axum(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut out = match &response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    };

    let headers = out.headers_mut();
    for (name, value) in response.headers {
        // from_bytes lowercases; from_static would panic on "Access-Control-..."
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
    out
}

/// Re-exports for testing the router without depending on axum directly.
pub mod reexports {
    pub use axum::body::Body;
    pub use axum::http::{Request, StatusCode};
    pub use axum::response::Response;
    pub use axum::Router;
}
