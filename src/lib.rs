pub mod config;
pub mod error;
pub mod extract;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod membership;
pub mod care;
pub mod optimistic;
pub mod email;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::email::Mailer;
use crate::state::{AppState, SharedState};

/// Build the router with the mailer described by `config.mail`.
pub fn build_app(db: Database, config: Config) -> (Router, SharedState) {
    let mailer = email::from_config(&config.mail);
    build_app_with_mailer(db, config, mailer)
}

/// Build the router around an explicit mailer. Returns the shared state too,
/// so the caller can run maintenance tasks against it.
pub fn build_app_with_mailer(
    db: Database,
    config: Config,
    mailer: Option<Arc<dyn Mailer>>,
) -> (Router, SharedState) {
    if mailer.is_none() {
        tracing::warn!("No mailer configured; password reset emails cannot be sent");
    }

    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState::new(db, config, mailer));

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state.clone());

    (app, state)
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "app": "TailTrack",
    }))
}
