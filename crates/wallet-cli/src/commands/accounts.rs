//! Account and balance commands

use anyhow::{bail, Result};
use chrono::Utc;
use wallet_core::db::Database;
use wallet_core::models::{Account, Balance};
use wallet_core::{month_start, parse_month};

use super::find_user;

pub fn cmd_accounts_list(db: &Database, login: &str) -> Result<()> {
    let user = find_user(db, login)?;
    let accounts = db.list_accounts_with_balance(user.id)?;

    if accounts.is_empty() {
        println!("No accounts for '{}'. Add one with: wallet accounts --user {} add <name>", login, login);
        return Ok(());
    }

    println!("💳 Accounts of {} ({}):", login, accounts.len());
    for (account, balance) in accounts {
        println!(
            "   [{}] {:<24} this month: +{:.2} / -{:.2} = {:.2}",
            account.id, account.name, balance.incomes, balance.expenses, balance.rest
        );
    }

    Ok(())
}

pub fn cmd_accounts_add(db: &Database, login: &str, name: &str) -> Result<Account> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Account name must not be empty");
    }

    let user = find_user(db, login)?;
    let account = db.create_account(user.id, name)?;

    println!("✅ Created account '{}' (id {})", account.name, account.id);
    Ok(account)
}

pub fn cmd_balance(
    db: &Database,
    login: &str,
    account_id: i64,
    month: Option<&str>,
) -> Result<Balance> {
    let user = find_user(db, login)?;
    let month = match month {
        Some(raw) => parse_month(raw)?,
        None => month_start(Utc::now().date_naive()),
    };

    let account = db.require_account(user.id, account_id)?;
    let balance = db.account_balance(user.id, account_id, month)?;

    println!("📊 {} - {}", account.name, balance.month.format("%B %Y"));
    println!("   Incomes:  {:>12.2}", balance.incomes);
    println!("   Expenses: {:>12.2}", balance.expenses);
    println!("   Rest:     {:>12.2}", balance.rest);

    Ok(balance)
}
