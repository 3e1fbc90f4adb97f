//! HTTP API: the status endpoint, notification history and health check

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::config::AccessConfig;
use crate::relay::StatusRelay;

/// Header carrying the shared secret for `/api/*`
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<StatusRelay>,
}

/// Build the axum router
pub fn build_router(relay: Arc<StatusRelay>, access: AccessConfig) -> Router {
    let app_state = AppState { relay };

    let api = Router::new()
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
        .layer(middleware::from_fn_with_state(
            Arc::new(access),
            require_internal_key,
        ));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .with_state(app_state)
}

/// Redirect requests that lack the configured shared secret
async fn require_internal_key(
    State(access): State<Arc<AccessConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = access.internal_key.as_deref().filter(|k| !k.is_empty()) else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        tracing::info!(
            path = %req.uri().path(),
            "missing or wrong {} header, redirecting to {}",
            INTERNAL_KEY_HEADER,
            access.redirect_to
        );
        Redirect::temporary(&access.redirect_to).into_response()
    }
}

async fn status_handler(State(app): State<AppState>) -> impl IntoResponse {
    // dropping the delivery handle detaches it, the response does not wait
    let outcome = app.relay.check_status().await;
    let status =
        StatusCode::from_u16(outcome.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Json(outcome.response),
    )
}

async fn history_handler(State(app): State<AppState>) -> impl IntoResponse {
    let state = app.relay.state().read().await;
    let history: Vec<_> = state.history.iter().cloned().collect();
    Json(history)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
