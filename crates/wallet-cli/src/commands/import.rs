//! Import command implementation

use std::path::Path;

use anyhow::{Context, Result};
use wallet_core::db::Database;
use wallet_core::{Error, ImportReport};

use super::find_user;

pub fn cmd_import(db: &Database, login: &str, account_id: i64, file: &Path) -> Result<ImportReport> {
    println!("📥 Importing operations from {}...", file.display());

    let data = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let user = find_user(db, login)?;
    let report = match db.import_operations(user.id, account_id, &data) {
        Ok(report) => report,
        Err(Error::UnprocessableOperations {
            account: Some(account),
            ..
        }) => {
            anyhow::bail!("Nothing imported: account {} not found for '{}'", account, login);
        }
        Err(Error::UnprocessableOperations { category_keys, .. }) => {
            let keys: Vec<String> = category_keys.iter().map(|k| k.to_string()).collect();
            anyhow::bail!(
                "Nothing imported: unknown category keys {} (use a name to create a category)",
                keys.join(", ")
            );
        }
        Err(e) => return Err(e).context("Import failed"),
    };

    println!("✅ Imported {} operation(s)", report.operations.len());

    if !report.skipped.is_empty() {
        println!("   ⚠️  Skipped {} row(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!("      line {}: {}", skipped.row, skipped.reason);
        }
    }

    Ok(report)
}
