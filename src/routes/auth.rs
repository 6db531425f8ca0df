use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::services::session::{SESSION_COOKIE, SESSION_TTL_SECS};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// POST /login — exchange operator credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    if request.username != state.admin.username || request.password != state.admin.password {
        tracing::warn!(username = %request.username, "rejected login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(AuthResponse {
                success: false,
                message: "Invalid credentials".to_string(),
            }),
        )
            .into_response();
    }

    let token = state.sessions.create();
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={SESSION_TTL_SECS}; SameSite=Lax"
    );

    (
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            message: "Login successful".to_string(),
        }),
    )
        .into_response()
}

/// POST /logout — destroy the caller's session and clear the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(&token);
    }

    let expired = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0");
    (
        [(header::SET_COOKIE, expired)],
        Json(AuthResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response()
}

/// Middleware guarding the API routes: a valid, unexpired session cookie is
/// required; everything else gets 401.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let authenticated = session_token(request.headers())
        .map(|token| state.sessions.validate(&token))
        .unwrap_or(false);

    if !authenticated {
        return super::api_failure(StatusCode::UNAUTHORIZED, "Authentication required")
            .into_response();
    }

    next.run(request).await
}

/// Pull the session token out of the Cookie header, if present.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}
