use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};

use gaggle_store::Store;
use gaggle_store::models::{SessionId, UserId};
use gaggle_types::api::{
    AuthResponse, Claims, LoginRequest, LogoutResponse, RegisterRequest, ResetCodeRequest,
    ResetPasswordRequest,
};

use crate::error::ApiError;
use crate::middleware::claims_from_headers;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub jwt_secret: String,
    /// Origin used to build absolute profile photo URLs.
    pub base_url: String,
    /// Where cropped profile photos land; served under `/static`.
    pub static_dir: PathBuf,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.chars().count() < 6 {
        return Err(short_password());
    }
    let password_hash = hash_password(&req.password)?;

    let (user, session) = state
        .store
        .register(&req.email, password_hash, &req.name_first, &req.name_last)
        .await?;
    let token = create_token(&state.jwt_secret, user, session)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { u_id: user.0, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .store
        .user_by_email(&req.email)
        .await
        .ok_or_else(bad_login)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(bad_login());
    }

    let session = state.store.open_session(user.id).await;
    let token = create_token(&state.jwt_secret, user.id, session)?;

    Ok(Json(AuthResponse { u_id: user.id.0, token }))
}

/// Close the presented session. Never fails: a bad or already-revoked
/// token just reports `is_success: false`.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<LogoutResponse> {
    let is_success = match claims_from_headers(&headers, &state.jwt_secret) {
        Some(claims) => state.store.end_session(SessionId(claims.jti)).await,
        None => false,
    };
    Json(LogoutResponse { is_success })
}

/// The response is identical whether or not the email is registered;
/// when it is, the code lands in the server log.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(req): Json<ResetCodeRequest>,
) -> Json<serde_json::Value> {
    let _ = state.store.issue_reset_code(&req.email).await;
    Json(serde_json::json!({}))
}

pub async fn password_reset_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.new_password.chars().count() < 6 {
        return Err(short_password());
    }
    let hash = hash_password(&req.new_password)?;
    state.store.reset_password(&req.reset_code, hash).await?;
    Ok(Json(serde_json::json!({})))
}

fn short_password() -> ApiError {
    ApiError::input("password must be at least 6 characters")
}

fn bad_login() -> ApiError {
    ApiError::input("incorrect email or password")
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn create_token(secret: &str, user: UserId, session: SessionId) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.0,
        jti: session.0,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
