//! Category operations

use std::collections::{BTreeSet, HashMap};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{column_operation_type, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, OperationType};

const CATEGORY_COLUMNS: &str = "id, user_id, name, type, created_at";

pub(crate) fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let created_at_str: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category_type: column_operation_type(row, 3)?,
        created_at: parse_datetime(&created_at_str),
    })
}

/// Insert a category on an existing connection (or transaction)
pub(crate) fn insert_category(
    conn: &Connection,
    user_id: i64,
    name: &str,
    category_type: OperationType,
) -> Result<Category> {
    conn.execute(
        "INSERT INTO categories (user_id, name, type) VALUES (?, ?, ?)",
        params![user_id, name, category_type.as_str()],
    )
    .map_err(|e| Error::on_conflict(e, "Category", name))?;

    let id = conn.last_insert_rowid();
    let category = conn.query_row(
        &format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS),
        params![id],
        row_to_category,
    )?;
    Ok(category)
}

/// Values bound per `IN (...)` lookup, below SQLite's historical 999-variable limit
const LOOKUP_CHUNK: usize = 900;

/// Fetch the user's categories among `keys`, one query per chunk of keys
pub(crate) fn categories_by_keys(
    conn: &Connection,
    user_id: i64,
    keys: &BTreeSet<i64>,
) -> Result<HashMap<i64, Category>> {
    let keys: Vec<i64> = keys.iter().copied().collect();
    let mut categories = HashMap::with_capacity(keys.len());

    for chunk in keys.chunks(LOOKUP_CHUNK) {
        for category in lookup_chunk(conn, user_id, "id", chunk)? {
            categories.insert(category.id, category);
        }
    }

    Ok(categories)
}

/// Fetch the user's categories whose name is exactly one of `names`, one query per chunk
pub(crate) fn categories_by_names(
    conn: &Connection,
    user_id: i64,
    names: &[&str],
) -> Result<HashMap<String, Category>> {
    let mut categories = HashMap::with_capacity(names.len());

    for chunk in names.chunks(LOOKUP_CHUNK) {
        for category in lookup_chunk(conn, user_id, "name", chunk)? {
            categories.insert(category.name.clone(), category);
        }
    }

    Ok(categories)
}

fn lookup_chunk<T: rusqlite::ToSql>(
    conn: &Connection,
    user_id: i64,
    column: &str,
    values: &[T],
) -> Result<Vec<Category>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM categories WHERE user_id = ? AND {} IN ({})",
        CATEGORY_COLUMNS, column, placeholders
    );

    let mut params_vec: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(values.len() + 1);
    params_vec.push(&user_id);
    for value in values {
        params_vec.push(value);
    }

    let mut stmt = conn.prepare(&sql)?;
    let categories = stmt
        .query_map(params_vec.as_slice(), row_to_category)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(categories)
}

impl Database {
    /// Create a category for a user
    pub fn create_category(
        &self,
        user_id: i64,
        name: &str,
        category_type: OperationType,
    ) -> Result<Category> {
        let conn = self.conn()?;
        let category = insert_category(&conn, user_id, name, category_type)?;
        info!(user_id, category_id = category.id, "Created category");
        Ok(category)
    }

    /// List a user's categories
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get a category by ID, scoped to its owner
    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                params![id, user_id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category or fail with NotFound
    pub fn require_category(&self, user_id: i64, id: i64) -> Result<Category> {
        self.get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Category {}", id)))
    }

    /// Change a category's name and type
    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        name: &str,
        category_type: OperationType,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE categories SET name = ?, type = ? WHERE id = ? AND user_id = ?",
                params![name, category_type.as_str(), id, user_id],
            )
            .map_err(|e| Error::on_conflict(e, "Category", name))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Category {}", id)));
        }

        info!(user_id, category_id = id, "Updated category");
        Ok(())
    }

    /// Delete a category along with its operations
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Category {}", id)));
        }

        info!(user_id, category_id = id, "Deleted category");
        Ok(())
    }
}
