//! Login and logout endpoints.

use axum::{
    extract::State,
    http::header::{HeaderName, SET_COOKIE},
    response::AppendHeaders,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{clear_session_cookie, session_cookie, verify_password};
use crate::config::is_production;
use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub data: LoginData,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

type CookieHeaders = AppendHeaders<[(HeaderName, String); 1]>;

/// POST /api/auth/login - Authenticate an admin and set the session cookie
#[tracing::instrument(name = "http.login", skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieHeaders, Json<LoginResponse>), AppError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let Some(user) = state.store.find_admin(&request.username).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = verify_password(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state
        .jwt
        .issue(user.id, &user.username)
        .map_err(|e| AppError::Internal(format!("Token issuance failed: {}", e)))?;

    let cookie = session_cookie(&token, state.jwt.token_ttl_seconds(), is_production());

    tracing::info!(username = %user.username, "Admin logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            success: true,
            data: LoginData {
                username: user.username,
            },
        }),
    ))
}

/// POST /api/auth/logout - Clear the session cookie
#[tracing::instrument(name = "http.logout")]
pub async fn logout() -> (CookieHeaders, Json<LogoutResponse>) {
    let cookie = clear_session_cookie(is_production());

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LogoutResponse { success: true }),
    )
}
