use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::DateTime;
use tracing::debug;

use gaggle_store::models::{ChannelId, MessageId};
use gaggle_types::api::{
    EditMessageRequest, PinRequest, ReactRequest, RemoveMessageRequest, SearchQuery,
    SearchResponse, SendLaterRequest, SendMessageRequest, SendMessageResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Identity;
use crate::views;

pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .store
        .send(identity.user, ChannelId(req.channel_id), &req.message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse { message_id: message.0 }),
    ))
}

/// Validate and allocate the message now, deliver it when the scheduled
/// time arrives. The spawned task owns the delivery.
pub async fn send_later(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SendLaterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let time_sent = DateTime::from_timestamp(req.time_sent, 0)
        .ok_or_else(|| ApiError::input("time_sent is not a valid timestamp"))?;
    let channel = ChannelId(req.channel_id);

    let message = state
        .store
        .prepare_send_later(identity.user, channel, &req.message, time_sent)
        .await?;

    let store = state.store.clone();
    let author = identity.user;
    let text = req.message;
    tokio::spawn(async move {
        crate::sleep_until(time_sent).await;
        store
            .deliver_scheduled(channel, author, message, text, time_sent)
            .await;
    });

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse { message_id: message.0 }),
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<EditMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .edit(identity.user, MessageId(req.message_id), &req.message)
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RemoveMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .remove(identity.user, MessageId(req.message_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn react(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ReactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .react(identity.user, MessageId(req.message_id), req.react_id)
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn unreact(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ReactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .unreact(identity.user, MessageId(req.message_id), req.react_id)
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn pin(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PinRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .pin(identity.user, MessageId(req.message_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn unpin(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PinRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .unpin(identity.user, MessageId(req.message_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let hits = state.store.search(identity.user, &query.query_str).await;
    debug!("search for {:?} matched {} messages", query.query_str, hits.len());
    Json(SearchResponse {
        messages: hits
            .iter()
            .map(|m| views::message_view(m, identity.user))
            .collect(),
    })
}
