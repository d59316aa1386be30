pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::Json;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::Mailer;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let mailer = config.smtp.as_ref().and_then(|smtp| {
        match Mailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("SMTP not available: {e}");
                None
            }
        }
    });

    let frontend_origin = config
        .frontend_origin
        .parse::<HeaderValue>()
        .expect("Invalid ESTETICA_FRONTEND_ORIGIN");

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        mailer,
    });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
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
        ))
        .with_state(state)
}

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "environment": state.config.environment,
    }))
}
