//! Category management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::validation::validate_name;
use crate::{AppError, AppState};
use wallet_core::models::{Category, OperationType};

/// Request body for creating or updating a category
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub category_type: OperationType,
}

/// GET /api/categories - List the user's categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.db.list_categories(user.id)?))
}

/// POST /api/categories - Add a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = validate_name("name", &req.name)?;
    let category = state
        .db
        .create_category(user.id, &name, req.category_type)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories/:id - Get a single category
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.db.require_category(user.id, id)?))
}

/// PUT /api/categories/:id - Change a category's name and type
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<StatusCode, AppError> {
    let name = validate_name("name", &req.name)?;
    state
        .db
        .update_category(user.id, id, &name, req.category_type)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/categories/:id - Remove a category and its operations
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_category(user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}
