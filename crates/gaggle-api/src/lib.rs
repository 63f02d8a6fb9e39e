pub mod admin;
pub mod auth;
pub mod channels;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod standup;
pub mod users;

mod views;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use tower_http::services::ServeDir;

pub use auth::{AppState, AppStateInner};

/// The full route tree over shared state. Everything except the auth
/// endpoints sits behind the session middleware; cropped profile photos
/// are served beside the API under `/static`.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/passwordreset/request", post(auth::password_reset_request))
        .route("/auth/passwordreset/reset", post(auth::password_reset_reset))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/channel/invite", post(channels::invite))
        .route("/channel/details", get(channels::details))
        .route("/channel/messages", get(channels::messages))
        .route("/channel/leave", post(channels::leave))
        .route("/channel/join", post(channels::join))
        .route("/channel/addowner", post(channels::add_owner))
        .route("/channel/removeowner", post(channels::remove_owner))
        .route("/channels/list", get(channels::list))
        .route("/channels/listall", get(channels::list_all))
        .route("/channels/create", post(channels::create))
        .route("/message/send", post(messages::send))
        .route("/message/sendlater", post(messages::send_later))
        .route("/message/react", post(messages::react))
        .route("/message/unreact", post(messages::unreact))
        .route("/message/pin", post(messages::pin))
        .route("/message/unpin", post(messages::unpin))
        .route("/message/remove", delete(messages::remove))
        .route("/message/edit", put(messages::edit))
        .route("/user/profile", get(users::profile))
        .route("/user/profile/setname", put(users::set_name))
        .route("/user/profile/setemail", put(users::set_email))
        .route("/user/profile/sethandle", put(users::set_handle))
        .route("/user/profile/uploadphoto", post(users::upload_photo))
        .route("/users/all", get(users::users_all))
        .route("/search", get(messages::search))
        .route("/admin/userpermission/change", post(admin::change_permission))
        .route("/standup/start", post(standup::start))
        .route("/standup/active", get(standup::active))
        .route("/standup/send", post(standup::send))
        .layer(from_fn_with_state(state.clone(), middleware::require_session))
        .with_state(state.clone());

    let static_files =
        Router::new().nest_service("/static", ServeDir::new(&state.static_dir));

    Router::new().merge(public).merge(protected).merge(static_files)
}

/// Sleep until a wall-clock instant; past instants return immediately.
pub(crate) async fn sleep_until(when: DateTime<Utc>) {
    let wait = (when - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}
