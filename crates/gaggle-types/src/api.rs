use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims carried by every session token. Canonical definition lives
/// here in gaggle-types so the API middleware, the auth handlers and the
/// integration tests all agree on one shape. `jti` is the session id the
/// registry uses for revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub u_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub is_success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub reset_code: String,
    pub new_password: String,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChannelRequest {
    pub name: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateChannelResponse {
    pub channel_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelRequest {
    pub channel_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelMemberRequest {
    pub channel_id: Uuid,
    pub u_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub channel_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub channel_id: Uuid,
    pub start: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub u_id: Uuid,
    pub name_first: String,
    pub name_last: String,
    pub profile_img_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChannelDetailsResponse {
    pub name: String,
    pub owner_members: Vec<MemberProfile>,
    pub all_members: Vec<MemberProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub channel_id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelListResponse {
    pub channels: Vec<ChannelSummary>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub channel_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendLaterRequest {
    pub channel_id: Uuid,
    pub message: String,
    pub time_sent: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditMessageRequest {
    pub message_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveMessageRequest {
    pub message_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    pub message_id: Uuid,
    pub react_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinRequest {
    pub message_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactView {
    pub react_id: u32,
    pub u_ids: Vec<Uuid>,
    pub is_this_user_reacted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub message_id: Uuid,
    pub u_id: Uuid,
    pub message: String,
    pub time_created: i64,
    pub reacts: Vec<ReactView>,
    pub is_pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct MessagesPageResponse {
    pub messages: Vec<MessageView>,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query_str: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub messages: Vec<MessageView>,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub u_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub u_id: Uuid,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
    pub profile_img_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetNameRequest {
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetHandleRequest {
    pub handle_str: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadPhotoRequest {
    pub img_url: String,
    pub x_start: u32,
    pub y_start: u32,
    pub x_end: u32,
    pub y_end: u32,
}

#[derive(Debug, Serialize)]
pub struct UsersAllResponse {
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePermissionRequest {
    pub u_id: Uuid,
    pub permission_id: u32,
}

// -- Standups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandupStartRequest {
    pub channel_id: Uuid,
    pub length: i64,
}

#[derive(Debug, Serialize)]
pub struct StandupStartResponse {
    pub time_finish: i64,
}

#[derive(Debug, Serialize)]
pub struct StandupActiveResponse {
    pub is_active: bool,
    pub time_finish: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandupSendRequest {
    pub channel_id: Uuid,
    pub message: String,
}
