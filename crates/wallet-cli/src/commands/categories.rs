//! Category commands

use anyhow::{anyhow, bail, Result};
use wallet_core::db::Database;
use wallet_core::models::{Category, OperationType};

use super::find_user;

pub fn cmd_categories_list(db: &Database, login: &str) -> Result<()> {
    let user = find_user(db, login)?;
    let categories = db.list_categories(user.id)?;

    if categories.is_empty() {
        println!("No categories for '{}'. They are created on import, or with: wallet categories --user {} add <name>", login, login);
        return Ok(());
    }

    println!("🏷️  Categories of {} ({}):", login, categories.len());
    for category in categories {
        println!(
            "   [{}] {} ({})",
            category.id, category.name, category.category_type
        );
    }

    Ok(())
}

pub fn cmd_categories_add(
    db: &Database,
    login: &str,
    name: &str,
    category_type: &str,
) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Category name must not be empty");
    }
    let category_type: OperationType = category_type.parse().map_err(|e: String| anyhow!(e))?;

    let user = find_user(db, login)?;
    let category = db.create_category(user.id, name, category_type)?;

    println!(
        "✅ Created {} category '{}' (id {})",
        category.category_type, category.name, category.id
    );
    Ok(category)
}
