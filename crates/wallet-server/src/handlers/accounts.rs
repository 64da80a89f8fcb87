//! Account management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::validation::{validate_month, validate_name};
use crate::{AppError, AppState};
use wallet_core::models::{Account, Balance};

/// Request body for creating or renaming an account
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub name: String,
}

/// Account with the balance of the current month
#[derive(Debug, Serialize)]
pub struct AccountWithBalance {
    #[serde(flatten)]
    pub account: Account,
    pub balance: Balance,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// `YYYY-MM` or `YYYY-MM-DD`
    pub month: Option<String>,
}

/// One month, or every month with operations (newest first)
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BalanceResponse {
    Month(Balance),
    History(Vec<Balance>),
}

/// GET /api/accounts - List the user's accounts with current-month balances
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<AccountWithBalance>>, AppError> {
    let accounts = state
        .db
        .list_accounts_with_balance(user.id)?
        .into_iter()
        .map(|(account, balance)| AccountWithBalance { account, balance })
        .collect();

    Ok(Json(accounts))
}

/// POST /api/accounts - Register a new account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let name = validate_name("name", &req.name)?;
    let account = state.db.create_account(user.id, &name)?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /api/accounts/:id - Get a single account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, AppError> {
    let account = state.db.require_account(user.id, id)?;
    Ok(Json(account))
}

/// PUT /api/accounts/:id - Rename an account
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<AccountRequest>,
) -> Result<StatusCode, AppError> {
    let name = validate_name("name", &req.name)?;
    state.db.rename_account(user.id, id, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/accounts/:id - Remove an account and its operations
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.db.delete_account(user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/accounts/:id/balance - Monthly balance, or the full history without `month`
pub async fn get_account_balance(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let response = match query.month.as_deref() {
        Some(raw) => {
            let month = validate_month(raw)?;
            BalanceResponse::Month(state.db.account_balance(user.id, id, month)?)
        }
        None => BalanceResponse::History(state.db.account_balances(user.id, id)?),
    };

    Ok(Json(response))
}
