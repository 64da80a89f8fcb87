//! Operation queries, single add and bulk import

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::accounts::account_by_id;
use super::categories::{categories_by_keys, categories_by_names, insert_category};
use super::{
    column_datetime, column_decimal, column_operation_type, format_datetime, parse_datetime,
    Database,
};
use crate::balance::month_bounds;
use crate::error::{Error, Result};
use crate::import::{parse_operations, ImportReport, MAX_IMPORT_SIZE};
use crate::models::{
    Category, CategoryRef, NewOperation, Operation, OperationFilter, MAX_PAGE_LIMIT,
};

/// Operation columns joined with the owning category, filtered through the account's owner
const OPERATION_SELECT: &str = r#"
    SELECT o.id, o.account_id, o.amount, o.description, o.type, o.created_on,
           c.id, c.user_id, c.name, c.type, c.created_at
    FROM operations o
    JOIN accounts a ON a.id = o.account_id
    JOIN categories c ON c.id = o.category_id
    WHERE a.user_id = ?
"#;

fn row_to_operation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Operation> {
    let category_created_at: String = row.get(10)?;

    Ok(Operation {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: column_decimal(row, 2)?,
        description: row.get(3)?,
        operation_type: column_operation_type(row, 4)?,
        created_on: column_datetime(row, 5)?,
        category: Category {
            id: row.get(6)?,
            user_id: row.get(7)?,
            name: row.get(8)?,
            category_type: column_operation_type(row, 9)?,
            created_at: parse_datetime(&category_created_at),
        },
    })
}

impl Database {
    /// Add a single operation after checking that account and category belong to the user
    pub fn add_operation(&self, user_id: i64, op: &NewOperation) -> Result<Operation> {
        if op.amount < Decimal::ZERO {
            return Err(Error::InvalidData(
                "Amount must not be negative, use the operation type for direction".into(),
            ));
        }

        self.require_account(user_id, op.account_id)?;
        let category = self.require_category(user_id, op.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO operations (account_id, category_id, amount, description, type, created_on)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                op.account_id,
                op.category_id,
                op.amount.to_string(),
                op.description,
                op.operation_type.as_str(),
                format_datetime(&op.created_on),
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(user_id, operation_id = id, account_id = op.account_id, "Added operation");

        Ok(Operation {
            id,
            account_id: op.account_id,
            category,
            amount: op.amount,
            description: op.description.clone(),
            operation_type: op.operation_type,
            created_on: op.created_on,
        })
    }

    /// List a user's operations, newest first
    pub fn list_operations(&self, user_id: i64, filter: &OperationFilter) -> Result<Vec<Operation>> {
        let conn = self.conn()?;

        let mut sql = String::from(OPERATION_SELECT);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(account_id) = filter.account_id {
            sql.push_str(" AND o.account_id = ?");
            params_vec.push(Box::new(account_id));
        }

        if let Some(category_id) = filter.category_id {
            sql.push_str(" AND o.category_id = ?");
            params_vec.push(Box::new(category_id));
        }

        if let Some(month) = filter.month {
            let (start, end) = month_bounds(month);
            sql.push_str(" AND o.created_on >= ? AND o.created_on < ?");
            params_vec.push(Box::new(format_datetime(&start)));
            params_vec.push(Box::new(format_datetime(&end)));
        }

        sql.push_str(" ORDER BY o.created_on DESC, o.id DESC LIMIT ? OFFSET ?");
        params_vec.push(Box::new(filter.limit.clamp(1, MAX_PAGE_LIMIT)));
        params_vec.push(Box::new(filter.offset.max(0)));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let operations = stmt
            .query_map(params_refs.as_slice(), row_to_operation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(operations)
    }

    /// Get an operation by ID, scoped to the owner of its account
    pub fn get_operation(&self, user_id: i64, id: i64) -> Result<Option<Operation>> {
        let conn = self.conn()?;
        let operation = conn
            .query_row(
                &format!("{} AND o.id = ?", OPERATION_SELECT),
                params![user_id, id],
                row_to_operation,
            )
            .optional()?;
        Ok(operation)
    }

    /// Get an operation or fail with NotFound
    pub fn require_operation(&self, user_id: i64, id: i64) -> Result<Operation> {
        self.get_operation(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Operation {}", id)))
    }

    /// Replace an operation's description (the only mutable field)
    pub fn update_operation_description(
        &self,
        user_id: i64,
        id: i64,
        description: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE operations SET description = ?
            WHERE id = ? AND account_id IN (SELECT id FROM accounts WHERE user_id = ?)
            "#,
            params![description, id, user_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Operation {}", id)));
        }

        info!(user_id, operation_id = id, "Updated operation description");
        Ok(())
    }

    /// Delete a single operation
    pub fn delete_operation(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            r#"
            DELETE FROM operations
            WHERE id = ? AND account_id IN (SELECT id FROM accounts WHERE user_id = ?)
            "#,
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Operation {}", id)));
        }

        info!(user_id, operation_id = id, "Deleted operation");
        Ok(())
    }

    /// Bulk-import operations from CSV into one account.
    ///
    /// An account the user does not own, or unknown numeric category keys,
    /// abort the whole import with `UnprocessableOperations` before anything is
    /// written. Unknown names become new categories typed after the first row
    /// that used them. Categories and operations are written in a single
    /// transaction; the returned operations follow input order.
    pub fn import_operations(&self, user_id: i64, account_id: i64, data: &str) -> Result<ImportReport> {
        if data.len() > MAX_IMPORT_SIZE {
            return Err(Error::InvalidData(format!(
                "Import is too large: {} bytes (max {})",
                data.len(),
                MAX_IMPORT_SIZE
            )));
        }

        let batch = parse_operations(data);

        let mut conn = self.conn()?;
        // Take the write lock up front; rolls back on drop unless committed
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if account_by_id(&tx, user_id, account_id)?.is_none() {
            warn!(user_id, account_id, "Import into an unknown account");
            return Err(Error::UnprocessableOperations {
                user_id,
                account: Some(account_id),
                category_keys: Vec::new(),
            });
        }

        let keys = batch.category_keys();
        let by_key = categories_by_keys(&tx, user_id, &keys)?;
        let unknown: Vec<i64> = keys
            .iter()
            .filter(|key| !by_key.contains_key(*key))
            .copied()
            .collect();

        if !unknown.is_empty() {
            warn!(user_id, account_id, ?unknown, "Import references unknown categories");
            return Err(Error::UnprocessableOperations {
                user_id,
                account: None,
                category_keys: unknown,
            });
        }

        let names = batch.category_names();
        let name_refs: Vec<&str> = names.iter().map(|(name, _)| name.as_str()).collect();
        let mut by_name = categories_by_names(&tx, user_id, &name_refs)?;

        let mut created_categories = 0;
        for (name, category_type) in &names {
            if !by_name.contains_key(name) {
                let category = insert_category(&tx, user_id, name, *category_type)?;
                by_name.insert(name.clone(), category);
                created_categories += 1;
            }
        }

        let mut operations = Vec::with_capacity(batch.operations.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO operations (account_id, category_id, amount, description, type, created_on)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for parsed in &batch.operations {
                let category = match &parsed.category {
                    CategoryRef::Key(key) => by_key.get(key),
                    CategoryRef::Name(name) => by_name.get(name),
                }
                .cloned()
                .ok_or_else(|| {
                    Error::InvalidData(format!("Row {} has an unresolved category", parsed.row))
                })?;

                stmt.execute(params![
                    account_id,
                    category.id,
                    parsed.amount.to_string(),
                    parsed.description,
                    parsed.operation_type.as_str(),
                    format_datetime(&parsed.created_on),
                ])?;

                operations.push(Operation {
                    id: tx.last_insert_rowid(),
                    account_id,
                    category,
                    amount: parsed.amount,
                    description: parsed.description.clone(),
                    operation_type: parsed.operation_type,
                    created_on: parsed.created_on,
                });
            }
        }

        tx.commit()?;

        info!(
            user_id,
            account_id,
            imported = operations.len(),
            skipped = batch.skipped.len(),
            created_categories,
            "Imported operations"
        );

        Ok(ImportReport {
            operations,
            skipped: batch.skipped,
        })
    }
}
