//! Categories, collections, items and reviews.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use trove_db::error::parse_id;
use trove_db::queries::NewItem;
use trove_types::api::{
    Claims, CreateCategoryRequest, CreateCollectionRequest, CreateItemRequest, CreateReviewRequest,
};
use trove_types::models::{Category, Collection, Item, Review};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_db;

fn required(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} is required.", field)));
    }
    Ok(())
}

// -- Categories --

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_categories()).await?;
    Ok(Json(rows.into_iter().map(Category::from).collect::<Vec<_>>()))
}

pub async fn create_category(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateCategoryRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    required(&req.category, "Category")?;
    let row = run_db(&state, move |db| db.create_category(&req.category)).await?;
    Ok((StatusCode::CREATED, Json(Category::from(row))))
}

// -- Collections --

pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_collections()).await?;
    Ok(Json(rows.into_iter().map(Collection::from).collect::<Vec<_>>()))
}

/// The caller becomes the owner.
pub async fn create_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateCollectionRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    required(&req.name, "Name")?;
    let row = run_db(&state, move |db| {
        db.create_collection(claims.sub, &req.name, req.description.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Collection::from(row))))
}

// -- Items --

pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_items()).await?;
    Ok(Json(rows.into_iter().map(Item::from).collect::<Vec<_>>()))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&item_id)?;
    let row = run_db(&state, move |db| db.get_item_by_id(&item_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(Json(Item::from(row)))
}

pub async fn create_item(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateItemRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    required(&req.name, "Name")?;
    let row = run_db(&state, move |db| {
        db.create_item(&NewItem {
            name: &req.name,
            description: req.description.as_deref(),
            image: req.image.as_deref(),
            categories: &req.categories,
        })
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Item::from(row))))
}

// -- Reviews --

pub async fn create_review(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateReviewRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = parse_id(&item_id)?;
    let row = run_db(&state, move |db| {
        db.create_review(item_id, claims.sub, req.rating, req.comment.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Review::from(row))))
}
