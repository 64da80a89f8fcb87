//! Registration, login and the current user

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{issue_token, CurrentUser, TOKEN_EXPIRE_HEADER, TOKEN_HEADER};
use crate::validation::{validate_login, validate_password};
use crate::{AppError, AppState};
use wallet_core::auth::{hash_password, verify_password};
use wallet_core::models::User;

/// Request body for registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
        }
    }
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    /// Token expiry in milliseconds since epoch
    pub expires: i64,
}

/// POST /api/auth/register - Create a user
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let login = validate_login(&req.login)?;
    validate_password(&req.password)?;

    let hash = hash_password(&req.password)?;
    let user = state.db.create_user(&login, &hash)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/auth/login - Exchange credentials for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login = validate_login(&req.login)?;

    let user = state
        .db
        .get_user_by_login(&login)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "Rejected login - wrong password");
        return Err(AppError::unprocessable("Wrong password").with_detail("field", "password"));
    }

    let (token, expires) = issue_token(&state.config, &user)?;
    let expires_ms = expires.timestamp_millis();

    info!(user_id = user.id, "User logged in");

    Ok((
        [
            (HeaderName::from_static(TOKEN_HEADER), token.clone()),
            (
                HeaderName::from_static(TOKEN_EXPIRE_HEADER),
                expires_ms.to_string(),
            ),
        ],
        Json(LoginResponse {
            user: UserResponse::from(&user),
            token,
            expires: expires_ms,
        }),
    ))
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
