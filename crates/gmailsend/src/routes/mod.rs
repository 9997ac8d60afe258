//! Route table.

pub mod auth;
pub mod email;
pub mod pages;

use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let email_routes = Router::new()
        .route("/email/send", post(email::send_email))
        .layer(DefaultBodyLimit::max(state.send_body_limit()));

    Router::new()
        .route("/", get(pages::index))
        .route("/auth-success", get(pages::auth_success))
        .route("/auth-error", get(pages::auth_error))
        .route("/auth-url", get(auth::auth_url))
        .route("/auth-status", get(auth::auth_status))
        .route("/authenticate", get(auth::authenticate))
        .merge(email_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
