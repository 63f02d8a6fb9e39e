use axum::{Extension, Json, extract::State};

use gaggle_store::models::UserId;
use gaggle_types::api::ChangePermissionRequest;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Identity;

/// Platform owners may promote or demote anyone, themselves included.
pub async fn change_permission(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChangePermissionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .change_permission(identity.user, UserId(req.u_id), req.permission_id)
        .await?;
    Ok(Json(serde_json::json!({})))
}
