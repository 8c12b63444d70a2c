//! Bearer token authentication middleware.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Validates the `Authorization: Bearer <token>` header and stores the
/// claims in request extensions for handlers that need the caller's
/// identity.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when the header is missing,
/// malformed or carries an invalid token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    let claims = state.auth.validate_token(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
