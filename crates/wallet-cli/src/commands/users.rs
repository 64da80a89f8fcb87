//! User commands

use anyhow::{bail, Result};
use wallet_core::auth::hash_password;
use wallet_core::db::Database;
use wallet_core::models::User;

/// Minimum password length accepted at registration
const MIN_PASSWORD_LEN: usize = 6;

pub fn cmd_users_add(db: &Database, login: &str, password: Option<&str>) -> Result<User> {
    let login = login.trim();
    if login.chars().count() < 3 {
        bail!("Login must be at least 3 characters");
    }

    let password = match password {
        Some(p) => p.to_string(),
        None => match std::env::var("WALLET_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => bail!("No password given: pass --password or set WALLET_PASSWORD"),
        },
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
    }

    let hash = hash_password(&password)?;
    let user = db.create_user(login, &hash)?;

    println!("✅ Created user '{}' (id {})", user.login, user.id);
    Ok(user)
}

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users yet. Create one with: wallet users add <login>");
        return Ok(());
    }

    println!("👤 Users ({}):", users.len());
    for user in users {
        println!(
            "   [{}] {} (since {})",
            user.id,
            user.login,
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}
