//! Account operations and balances

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{
    column_datetime, column_decimal, column_operation_type, format_datetime, parse_datetime,
    Database,
};
use crate::balance::{aggregate, month_bounds, month_start, monthly_balances};
use crate::error::{Error, Result};
use crate::models::{Account, Balance};

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let created_at_str: String = row.get(3)?;
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
    })
}

/// Look up an account on an existing connection (or transaction), scoped to its owner
pub(crate) fn account_by_id(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, user_id, name, created_at FROM accounts WHERE id = ? AND user_id = ?",
            params![id, user_id],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

impl Database {
    /// Register an account for a user
    pub fn create_account(&self, user_id: i64, name: &str) -> Result<Account> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO accounts (user_id, name) VALUES (?, ?)",
            params![user_id, name],
        )
        .map_err(|e| Error::on_conflict(e, "Account", name))?;

        let id = conn.last_insert_rowid();
        info!(user_id, account_id = id, "Created account");

        conn.query_row(
            "SELECT id, user_id, name, created_at FROM accounts WHERE id = ?",
            params![id],
            row_to_account,
        )
        .map_err(Error::from)
    }

    /// List a user's accounts
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, created_at FROM accounts WHERE user_id = ? ORDER BY name",
        )?;

        let accounts = stmt
            .query_map(params![user_id], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// List a user's accounts, each with the balance of the current month
    pub fn list_accounts_with_balance(&self, user_id: i64) -> Result<Vec<(Account, Balance)>> {
        let month = month_start(Utc::now().date_naive());

        self.list_accounts(user_id)?
            .into_iter()
            .map(|account| {
                let balance = self.month_balance(account.id, month)?;
                Ok((account, balance))
            })
            .collect()
    }

    /// Get an account by ID, scoped to its owner
    pub fn get_account(&self, user_id: i64, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        account_by_id(&conn, user_id, id)
    }

    /// Get an account or fail with NotFound
    pub fn require_account(&self, user_id: i64, id: i64) -> Result<Account> {
        self.get_account(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Account {}", id)))
    }

    /// Rename an account
    pub fn rename_account(&self, user_id: i64, id: i64, name: &str) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE accounts SET name = ? WHERE id = ? AND user_id = ?",
                params![name, id, user_id],
            )
            .map_err(|e| Error::on_conflict(e, "Account", name))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Account {}", id)));
        }

        info!(user_id, account_id = id, "Renamed account");
        Ok(())
    }

    /// Delete an account along with its operations
    pub fn delete_account(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM accounts WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Account {}", id)));
        }

        info!(user_id, account_id = id, "Deleted account");
        Ok(())
    }

    /// Balance of one account for the month containing `month`
    pub fn account_balance(&self, user_id: i64, account_id: i64, month: NaiveDate) -> Result<Balance> {
        self.require_account(user_id, account_id)?;
        self.month_balance(account_id, month)
    }

    /// Balance of every month with operations on the account, newest first
    pub fn account_balances(&self, user_id: i64, account_id: i64) -> Result<Vec<Balance>> {
        self.require_account(user_id, account_id)?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT created_on, amount, type FROM operations WHERE account_id = ?",
        )?;

        let rows = stmt
            .query_map(params![account_id], |row| {
                Ok((column_datetime(row, 0)?, column_decimal(row, 1)?, column_operation_type(row, 2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        monthly_balances(rows)
    }

    /// Aggregate an account's operations within one month (ownership already checked)
    fn month_balance(&self, account_id: i64, month: NaiveDate) -> Result<Balance> {
        let (start, end) = month_bounds(month);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT amount, type FROM operations
            WHERE account_id = ? AND created_on >= ? AND created_on < ?
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![account_id, format_datetime(&start), format_datetime(&end)],
                |row| Ok((column_decimal(row, 0)?, column_operation_type(row, 1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        aggregate(month, rows)
    }
}
