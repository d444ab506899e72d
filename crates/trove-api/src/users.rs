use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use trove_db::error::parse_id;
use trove_db::profile::UserPatch;
use trove_types::api::{MessageResponse, UpdateUserRequest};
use trove_types::models::User;

use crate::auth::{AppState, hash_password};
use crate::error::ApiError;
use crate::run_db;

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_users()).await?;
    let users: Vec<User> = rows.into_iter().map(Into::into).collect();
    Ok(Json(users))
}

/// Profile lookup by username, with collections and categories resolved.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = run_db(&state, move |db| db.get_user_profile(&username))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(profile))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&id)?;

    let password = req.password.as_deref().map(hash_password).transpose()?;
    let patch = UserPatch {
        email: req.email,
        password,
        username: req.username,
        image_url: req.image_url,
        header_image_url: req.header_image_url,
        userbio: req.userbio,
        pronouns: req.pronouns,
        categories: req.categories,
        expected_version: req.version,
    };

    let updated = run_db(&state, move |db| db.update_user(&id, patch)).await?;
    Ok(Json(User::from(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = id.clone();
    run_db(&state, move |db| db.delete_user(&target)).await?;
    Ok(Json(MessageResponse::new(format!(
        "User with {} is removed successfully.",
        id
    ))))
}
