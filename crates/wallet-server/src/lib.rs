//! Wallet Web Server
//!
//! Axum-based REST API for the Wallet personal finance tracker.
//!
//! Security features:
//! - Token authentication (HS256 JWT issued at login) on every `/api` route
//!   except registration and login
//! - Restrictive CORS policy
//! - Input validation (names, pagination limits, import size)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use wallet_core::db::Database;

mod auth;
mod handlers;
mod validation;

pub use auth::{CurrentUser, TOKEN_EXPIRE_HEADER, TOKEN_HEADER};
pub use wallet_core::{MAX_IMPORT_SIZE, MAX_PAGE_LIMIT};

/// Default access token lifetime (24 hours)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// HMAC secret used to sign and verify access tokens
    pub secret_key: String,
    /// Access token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            allowed_origins: vec![],
        }
    }
}

/// Parse a comma-separated origin list, dropping blanks
pub fn parse_allowed_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// GET /health - Liveness check
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let public_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Accounts
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/:id",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route("/accounts/:id/balance", get(handlers::get_account_balance))
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        // Operations
        .route(
            "/operations",
            get(handlers::list_operations).post(handlers::create_operation),
        )
        .route(
            "/operations/bulk",
            // CSV travels inside the JSON body, leave room for the envelope
            post(handlers::bulk_create_operations)
                .layer(DefaultBodyLimit::max(MAX_IMPORT_SIZE + 64 * 1024)),
        )
        .route(
            "/operations/:id",
            get(handlers::get_operation)
                .put(handlers::update_operation)
                .delete(handlers::delete_operation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    // CORS: explicit origins only, nothing when unset
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static(TOKEN_HEADER),
            ])
            .expose_headers([
                HeaderName::from_static(TOKEN_HEADER),
                HeaderName::from_static(TOKEN_EXPIRE_HEADER),
            ])
    };

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.secret_key.len() < 32 {
        warn!("⚠️  Secret key is shorter than 32 bytes - tokens are easier to forge");
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Extra fields merged into the JSON body
    details: Option<serde_json::Map<String, serde_json::Value>>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            details: None,
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unprocessable(msg: &str) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    /// Attach an extra field to the error body
    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.details
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let mut body = self.details.unwrap_or_default();
        body.insert("error".to_string(), serde_json::Value::String(self.message));

        (self.status, Json(serde_json::Value::Object(body))).into_response()
    }
}

impl From<wallet_core::Error> for AppError {
    fn from(err: wallet_core::Error) -> Self {
        use wallet_core::Error;

        match err {
            Error::NotFound(what) => Self::not_found(&format!("{} not found", what)),
            Error::AlreadyExists { entity, name } => {
                Self::unprocessable(&format!("{} '{}' already exists", entity, name))
            }
            Error::UnprocessableOperations {
                account: Some(account),
                ..
            } => Self::unprocessable("Operations reference an unknown account")
                .with_detail("account", account),
            Error::UnprocessableOperations { category_keys, .. } => {
                Self::unprocessable("Operations reference unknown categories")
                    .with_detail("categories", category_keys)
            }
            Error::InvalidData(msg) => Self::unprocessable(&msg),
            Error::Auth(msg) => Self::unauthorized(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                details: None,
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            details: None,
            internal: Some(err),
        }
    }
}
