use axum::{
    Extension, Json,
    extract::{Query, State},
};
use tracing::debug;

use gaggle_store::models::ChannelId;
use gaggle_types::api::{
    ChannelQuery, StandupActiveResponse, StandupSendRequest, StandupStartRequest,
    StandupStartResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Identity;

/// Open the standup window and schedule its flush. The flush task
/// checks it still owns the standup, so a stale task after a restart of
/// the window does nothing.
pub async fn start(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<StandupStartRequest>,
) -> Result<Json<StandupStartResponse>, ApiError> {
    let channel = ChannelId(req.channel_id);
    let finish = state
        .store
        .standup_start(identity.user, channel, req.length)
        .await?;

    let store = state.store.clone();
    tokio::spawn(async move {
        crate::sleep_until(finish).await;
        if let Some(posted) = store.flush_standup(channel, finish).await {
            debug!("standup summary {posted} posted to channel {channel}");
        }
    });

    Ok(Json(StandupStartResponse {
        time_finish: finish.timestamp(),
    }))
}

pub async fn active(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
    Query(query): Query<ChannelQuery>,
) -> Result<Json<StandupActiveResponse>, ApiError> {
    let finish = state.store.standup_active(ChannelId(query.channel_id)).await?;
    Ok(Json(StandupActiveResponse {
        is_active: finish.is_some(),
        time_finish: finish.map(|t| t.timestamp()),
    }))
}

pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<StandupSendRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .standup_send(identity.user, ChannelId(req.channel_id), &req.message)
        .await?;
    Ok(Json(serde_json::json!({})))
}
