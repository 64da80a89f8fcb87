//! Access tokens and the authentication middleware
//!
//! Tokens are HS256 JWTs carrying the user id (`sub`), login and expiry.
//! Clients send them either as `Authorization: Bearer <token>` or in the
//! `X-ACCESS-TOKEN` header.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{AppError, AppState, ServerConfig};
use wallet_core::models::User;

/// Header carrying the access token (request and login response)
pub const TOKEN_HEADER: &str = "x-access-token";

/// Login response header with the token expiry in milliseconds since epoch
pub const TOKEN_EXPIRE_HEADER: &str = "x-access-token-expire";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: String,
    login: String,
    exp: i64,
}

/// The authenticated user, inserted into request extensions by the middleware
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Issue a signed token for `user`, returning it with its expiry
pub(crate) fn issue_token(
    config: &ServerConfig,
    user: &User,
) -> Result<(String, DateTime<Utc>), AppError> {
    let expires = Utc::now() + Duration::seconds(config.token_ttl_secs);
    let claims = Claims {
        sub: user.id.to_string(),
        login: user.login.clone(),
        exp: expires.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(anyhow::Error::from)?;

    Ok((token, expires))
}

/// Validate a token's signature and expiry, returning the user id it names
fn verify_token(token: &str, secret: &str) -> Result<i64, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| e.to_string())
    .and_then(|data| {
        data.claims
            .sub
            .parse()
            .map_err(|_| "token subject is not a user id".to_string())
    })
}

/// Pull the token out of `Authorization: Bearer` or `X-ACCESS-TOKEN`
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .or_else(|| headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware - resolves the token to a live user or rejects with 401
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) = extract_token(request.headers()) else {
        warn!(path = %path, "Unauthorized request - no access token");
        return AppError::unauthorized("Access token required").into_response();
    };

    let user_id = match verify_token(token, &state.config.secret_key) {
        Ok(id) => id,
        Err(e) => {
            warn!(path = %path, error = %e, "Unauthorized request - invalid token");
            return AppError::unauthorized("Invalid or expired access token").into_response();
        }
    };

    let user = match state.db.get_user(user_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(path = %path, user_id, "Unauthorized request - token for unknown user");
            return AppError::unauthorized("Invalid or expired access token").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    debug!(user_id, path = %path, "Authenticated request");
    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
