//! OAuth routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// `GET /auth-url` response.
#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    /// Google consent page.
    pub url: String,
}

/// `GET /auth-status` response.
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    /// Whether a token is on file.
    pub authenticated: bool,
}

/// Query string Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// One-time authorization code.
    pub code: Option<String>,
    /// Set instead of `code` when the user declines consent.
    pub error: Option<String>,
}

/// `GET /auth-url`
pub async fn auth_url(State(state): State<AppState>) -> Result<Json<AuthUrlResponse>, ApiError> {
    let url = state.auth.auth_url()?;
    info!("Issued consent URL");
    Ok(Json(AuthUrlResponse { url }))
}

/// `GET /auth-status`
///
/// Reports whether a token file exists. If existence cannot be determined
/// the answer is `false`.
pub async fn auth_status(State(state): State<AppState>) -> Json<AuthStatusResponse> {
    let authenticated = state.auth.is_authenticated().await.unwrap_or_else(|e| {
        warn!("Cannot check token file: {e}");
        false
    });
    info!(authenticated, "Auth status");
    Json(AuthStatusResponse { authenticated })
}

/// `GET /authenticate?code=...`
///
/// Always answers with a redirect, including for a malformed query string.
pub async fn authenticate(
    State(state): State<AppState>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!("Malformed callback query: {rejection}");
            return found(&state.config.auth_error_url());
        }
    };

    if let Some(reason) = query.error {
        warn!(%reason, "Consent was not granted");
        return found(&state.config.auth_error_url());
    }

    let code = query.code.unwrap_or_default();
    match state.auth.exchange_code(&code).await {
        Ok(()) => {
            info!("Signed in to Gmail");
            found(&state.config.auth_success_url())
        }
        Err(e) => {
            warn!("Sign-in failed: {e}");
            found(&state.config.auth_error_url())
        }
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
