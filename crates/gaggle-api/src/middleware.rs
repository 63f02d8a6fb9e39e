use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use gaggle_store::models::{SessionId, UserId};
use gaggle_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// The resolved caller, injected into request extensions by
/// [`require_session`].
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user: UserId,
    pub session: SessionId,
}

/// Decode the bearer token's claims without consulting the session
/// registry. Signature or expiry problems read as no token at all.
pub(crate) fn claims_from_headers(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Extract the JWT from the Authorization header and check its session
/// is still active. Every failure mode is the same access error, raised
/// before the handler sees the request.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_headers(req.headers(), &state.jwt_secret)
        .ok_or_else(|| ApiError::access("invalid or expired session token"))?;

    let session = SessionId(claims.jti);
    let user = state
        .store
        .resolve_session(session)
        .await
        .ok_or_else(|| ApiError::access("invalid or expired session token"))?;

    req.extensions_mut().insert(Identity { user, session });
    Ok(next.run(req).await)
}
