//! Operation handlers: queries, single add and bulk import

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::validation::{validate_amount, validate_month, validate_page, validate_timestamp};
use crate::{AppError, AppState};
use wallet_core::models::{NewOperation, Operation, OperationFilter, OperationType};
use wallet_core::ImportReport;

/// Query parameters for listing operations
#[derive(Debug, Deserialize)]
pub struct OperationsQuery {
    pub account: Option<i64>,
    pub category: Option<i64>,
    /// `YYYY-MM` or `YYYY-MM-DD`
    pub month: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for adding a single operation
#[derive(Debug, Deserialize)]
pub struct CreateOperationRequest {
    /// String or number, not negative
    pub amount: serde_json::Value,
    #[serde(default)]
    pub description: String,
    pub account: i64,
    pub category: i64,
    #[serde(rename = "type", default)]
    pub operation_type: OperationType,
    /// ISO 8601, e.g. `2021-03-01T10:00:00`
    pub created_on: String,
}

/// Request body for bulk import
#[derive(Debug, Deserialize)]
pub struct BulkOperationsRequest {
    pub account: i64,
    /// Raw CSV: `created_on,amount,category,description` per row, no header
    pub operations: String,
}

/// Request body for updating an operation
#[derive(Debug, Deserialize)]
pub struct UpdateOperationRequest {
    pub description: String,
}

/// GET /api/operations - List operations with optional filters
pub async fn list_operations(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<OperationsQuery>,
) -> Result<Json<Vec<Operation>>, AppError> {
    let (limit, offset) = validate_page(query.limit, query.offset);
    let month = query.month.as_deref().map(validate_month).transpose()?;

    let filter = OperationFilter {
        account_id: query.account,
        category_id: query.category,
        month,
        limit,
        offset,
    };

    Ok(Json(state.db.list_operations(user.id, &filter)?))
}

/// POST /api/operations - Add a single operation
pub async fn create_operation(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateOperationRequest>,
) -> Result<(StatusCode, Json<Operation>), AppError> {
    let new = NewOperation {
        account_id: req.account,
        category_id: req.category,
        amount: validate_amount(&req.amount)?,
        description: req.description.trim().to_string(),
        operation_type: req.operation_type,
        created_on: validate_timestamp(&req.created_on)?,
    };

    let operation = state.db.add_operation(user.id, &new)?;
    Ok((StatusCode::CREATED, Json(operation)))
}

/// POST /api/operations/bulk - Import operations from CSV into one account
pub async fn bulk_create_operations(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<BulkOperationsRequest>,
) -> Result<(StatusCode, Json<ImportReport>), AppError> {
    let report = state
        .db
        .import_operations(user.id, req.account, &req.operations)?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/operations/:id - Get a single operation
pub async fn get_operation(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Operation>, AppError> {
    Ok(Json(state.db.require_operation(user.id, id)?))
}

/// PUT /api/operations/:id - Change an operation's description
pub async fn update_operation(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOperationRequest>,
) -> Result<StatusCode, AppError> {
    state
        .db
        .update_operation_description(user.id, id, req.description.trim())?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/operations/:id - Remove a single operation
pub async fn delete_operation(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_operation(user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}
