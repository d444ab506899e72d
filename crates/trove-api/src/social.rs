use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use trove_types::api::MessageResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_db;

// Path ids are passed through unchecked; an id that does not resolve is a 404.

pub async fn follow(
    State(state): State<AppState>,
    Path((user_id, followed_user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let username = run_db(&state, move |db| db.follow(&user_id, &followed_user_id)).await?;
    Ok(Json(MessageResponse::new(format!(
        "You are now following {}",
        username
    ))))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path((user_id, followed_user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let username = run_db(&state, move |db| db.unfollow(&user_id, &followed_user_id)).await?;
    Ok(Json(MessageResponse::new(format!(
        "You have unfollowed {}",
        username
    ))))
}
