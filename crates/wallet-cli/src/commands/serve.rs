//! Server command implementation

use std::path::Path;

use anyhow::{bail, Context, Result};
use wallet_server::{parse_allowed_origins, ServerConfig, DEFAULT_TOKEN_TTL_SECS};

use super::open_db;

/// Build the server configuration from WALLET_* environment variables
pub fn server_config_from_env() -> Result<ServerConfig> {
    let secret_key = match std::env::var("WALLET_SECRET_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => bail!("WALLET_SECRET_KEY must be set to sign access tokens"),
    };

    let token_ttl_secs = match std::env::var("WALLET_TOKEN_TTL") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|ttl| *ttl > 0)
            .with_context(|| format!("WALLET_TOKEN_TTL must be a positive number of seconds, got '{}'", raw))?,
        _ => DEFAULT_TOKEN_TTL_SECS,
    };

    let allowed_origins =
        parse_allowed_origins(&std::env::var("WALLET_ALLOWED_ORIGINS").unwrap_or_default());

    Ok(ServerConfig {
        secret_key,
        token_ttl_secs,
        allowed_origins,
    })
}

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let config = server_config_from_env()?;

    println!("🚀 Starting Wallet web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   🔒 Token lifetime: {}s", config.token_ttl_secs);
    if !config.allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", config.allowed_origins.join(", "));
    }

    let db = open_db(db_path)?;

    wallet_server::serve_with_config(db, host, port, config)
        .await
        .context("Server error")
}
