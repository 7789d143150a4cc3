//! Session token authentication middleware

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authentication middleware
///
/// Looks up the Bearer session token in the shared store and puts the
/// `Session` into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let id = Uuid::parse_str(token.trim()).map_err(|_| ApiError::Unauthorized)?;

    let session = state.sessions.get(id).await?.ok_or_else(|| {
        debug!("Unknown or expired session {}", id);
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
