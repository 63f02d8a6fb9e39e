use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use gaggle_store::models::{ChannelId, UserId};
use gaggle_types::api::{
    ChannelDetailsResponse, ChannelListResponse, ChannelMemberRequest, ChannelQuery,
    ChannelRequest, ChannelSummary, CreateChannelRequest, CreateChannelResponse,
    MessagesPageResponse, MessagesQuery,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Identity;
use crate::views;

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = state
        .store
        .create_channel(identity.user, &req.name, req.is_public)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateChannelResponse { channel_id: channel.0 }),
    ))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChannelMemberRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .invite(identity.user, ChannelId(req.channel_id), UserId(req.u_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn join(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChannelRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .join(identity.user, ChannelId(req.channel_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChannelRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .leave(identity.user, ChannelId(req.channel_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn add_owner(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChannelMemberRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .add_owner(identity.user, ChannelId(req.channel_id), UserId(req.u_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn remove_owner(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChannelMemberRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .remove_owner(identity.user, ChannelId(req.channel_id), UserId(req.u_id))
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn details(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ChannelQuery>,
) -> Result<Json<ChannelDetailsResponse>, ApiError> {
    let details = state
        .store
        .details(identity.user, ChannelId(query.channel_id))
        .await?;
    Ok(Json(ChannelDetailsResponse {
        name: details.name,
        owner_members: details
            .owners
            .iter()
            .map(|u| views::member_view(&state, u))
            .collect(),
        all_members: details
            .members
            .iter()
            .map(|u| views::member_view(&state, u))
            .collect(),
    }))
}

pub async fn messages(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesPageResponse>, ApiError> {
    let page = state
        .store
        .messages_page(identity.user, ChannelId(query.channel_id), query.start)
        .await?;
    Ok(Json(MessagesPageResponse {
        messages: page
            .messages
            .iter()
            .map(|m| views::message_view(m, identity.user))
            .collect(),
        start: page.start,
        end: page.end,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<ChannelListResponse> {
    let channels = state.store.my_channels(identity.user).await;
    Json(ChannelListResponse {
        channels: channels
            .into_iter()
            .map(|(id, name)| ChannelSummary { channel_id: id.0, name })
            .collect(),
    })
}

pub async fn list_all(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> Json<ChannelListResponse> {
    let channels = state.store.all_channels().await;
    Json(ChannelListResponse {
        channels: channels
            .into_iter()
            .map(|(id, name)| ChannelSummary { channel_id: id.0, name })
            .collect(),
    })
}
