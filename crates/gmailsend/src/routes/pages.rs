//! Bundled HTML pages.

use axum::response::Html;

const INDEX: &str = include_str!("../../assets/index.html");
const AUTH_SUCCESS: &str = include_str!("../../assets/auth-success.html");
const AUTH_ERROR: &str = include_str!("../../assets/auth-error.html");

/// `GET /` serves the send form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX)
}

/// `GET /auth-success`
pub async fn auth_success() -> Html<&'static str> {
    Html(AUTH_SUCCESS)
}

/// `GET /auth-error`
pub async fn auth_error() -> Html<&'static str> {
    Html(AUTH_ERROR)
}
