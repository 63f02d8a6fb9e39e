use axum::{
    Extension, Json,
    extract::{Query, State},
};
use image::{GenericImageView, ImageFormat};
use tracing::{error, info};
use uuid::Uuid;

use gaggle_store::models::UserId;
use gaggle_types::api::{
    ProfileQuery, ProfileResponse, SetEmailRequest, SetHandleRequest, SetNameRequest,
    UploadPhotoRequest, UsersAllResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Identity;
use crate::views;

pub async fn profile(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.store.user(UserId(query.u_id)).await?;
    Ok(Json(ProfileResponse {
        user: views::profile_view(&state, &user),
    }))
}

pub async fn set_name(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SetNameRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .set_name(identity.user, &req.name_first, &req.name_last)
        .await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn set_email(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SetEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.set_email(identity.user, &req.email).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn set_handle(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SetHandleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.set_handle(identity.user, &req.handle_str).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn users_all(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> Json<UsersAllResponse> {
    let users = state.store.users_all().await;
    Json(UsersAllResponse {
        users: users
            .iter()
            .map(|u| views::profile_view(&state, u))
            .collect(),
    })
}

/// Fetch a JPEG from a URL, crop it to the requested box and serve the
/// result from the static directory as the caller's profile photo.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UploadPhotoRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.x_end <= req.x_start || req.y_end <= req.y_start {
        return Err(ApiError::input("crop box is empty"));
    }

    let response = reqwest::get(&req.img_url)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("could not fetch image: {e}")))?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(ApiError::input("image url did not return HTTP 200"));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("could not read image body: {e}")))?;

    let img = crop_jpeg(&bytes, req.x_start, req.y_start, req.x_end, req.y_end)?;

    let file = format!("{}.jpg", Uuid::new_v4());
    let path = state.static_dir.join(&file);
    tokio::task::spawn_blocking(move || img.save_with_format(&path, ImageFormat::Jpeg))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {e}");
            ApiError::Internal(anyhow::anyhow!("photo save interrupted"))
        })?
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("could not save photo: {e}")))?;

    state.store.set_photo(identity.user, file.clone()).await?;
    info!("user {} uploaded profile photo {file}", identity.user);
    Ok(Json(serde_json::json!({})))
}

/// Decode JPEG bytes and crop to `[x_start, x_end) x [y_start, y_end)`.
fn crop_jpeg(
    bytes: &[u8],
    x_start: u32,
    y_start: u32,
    x_end: u32,
    y_end: u32,
) -> Result<image::DynamicImage, ApiError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|_| ApiError::input("image is not a JPG"))?;
    let (width, height) = img.dimensions();
    if x_end > width || y_end > height {
        return Err(ApiError::input("crop box is outside the image"));
    }
    Ok(img.crop_imm(x_start, y_start, x_end - x_start, y_end - y_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    #[test]
    fn crop_respects_the_image_bounds() {
        let bytes = sample_jpeg(40, 30);

        let cropped = crop_jpeg(&bytes, 5, 5, 25, 20).unwrap();
        assert_eq!(cropped.dimensions(), (20, 15));

        assert!(crop_jpeg(&bytes, 0, 0, 41, 30).is_err());
        assert!(crop_jpeg(&bytes, 0, 0, 40, 31).is_err());
        assert!(crop_jpeg(b"not a jpeg", 0, 0, 10, 10).is_err());
    }
}
