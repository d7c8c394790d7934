use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::auth::session_token;
use crate::error::AppError;

use super::AppState;

/// Session authentication middleware for protected route prefixes.
///
/// Reads the session token from the `auth-token` cookie (or a bearer
/// header), verifies it, and injects the authenticated [`Claims`] as a
/// request extension. Missing, invalid, or expired tokens are denied with
/// a 401 rather than falling through.
///
/// [`Claims`]: crate::auth::Claims
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = session_token(req.headers()).and_then(|token| state.jwt.verify(&token));

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!(path = %req.uri().path(), "Unauthenticated admin request");
            Err(AppError::Unauthorized("Unauthorized".to_string()))
        }
    }
}
