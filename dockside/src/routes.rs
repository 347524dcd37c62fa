use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::forms::{application, consultation, MailRouting};
use crate::relay::Relay;

/// Shared state handed to every handler.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub relay: Relay,
    pub routing: Arc<MailRouting>,
}

impl AppState {
    pub fn new(relay: Relay, routing: MailRouting) -> Self {
        Self {
            relay,
            routing: Arc::new(routing),
        }
    }
}

/// All public routes. Other methods on these paths get `405`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/submit-consultation", post(consultation::submit))
        .route(
            "/submit-application",
            post(application::submit)
                .layer(DefaultBodyLimit::max(application::BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
