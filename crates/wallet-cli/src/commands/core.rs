//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `resolve_db_path` - Pick the database file from flag, env or platform default
//! - `open_db` - Shared utility to open the database
//! - `find_user` - Look up the user a command acts for
//! - `cmd_init` - Initialize the database

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;
use wallet_core::db::Database;
use wallet_core::models::User;

/// Resolve the database path: `--db`, then `$WALLET_DB`, then `<data dir>/wallet/wallet.db`
pub fn resolve_db_path(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os("WALLET_DB").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let dir = dirs::data_dir()
        .context("Could not determine a data directory, pass --db")?
        .join("wallet");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    Ok(dir.join("wallet.db"))
}

/// Open the database, running migrations
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", db_path.display()))?;
    debug!(path = path_str, "Opening database");
    Database::new(path_str).context("Failed to open database")
}

/// Find a user by login or fail with a readable error
pub fn find_user(db: &Database, login: &str) -> Result<User> {
    db.get_user_by_login(login)?
        .ok_or_else(|| anyhow!("User '{}' not found (create it with: wallet users add {})", login, login))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let users = db.list_users()?;

    println!("✅ Database initialized successfully!");
    println!("   Users: {}", users.len());
    println!();
    println!("Next steps:");
    println!("  1. Create a user: wallet users add alice");
    println!("  2. Add an account: wallet accounts --user alice add Card");
    println!("  3. Import operations: wallet import --user alice --account 1 --file ops.csv");
    println!("  4. Start the API: WALLET_SECRET_KEY=... wallet serve");

    Ok(())
}
