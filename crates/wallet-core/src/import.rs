//! Bulk operation import from delimited text
//!
//! Rows have no header and four comma-separated fields:
//!
//! ```text
//! created_on,amount,category,description
//! 01.03.2021 10:00:00,-150.50,Food,Lunch
//! 2021-03-01T10:00:00,1000,2,Salary
//! ```
//!
//! Parsing is split from persistence: [`parse_operations`] never touches the
//! database and never fails on a bad row. Rows it cannot read end up in the
//! batch's skip list. Reconciliation against the store lives in
//! `Database::import_operations`.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::{CategoryRef, Operation, OperationType, MAX_NAME_LEN};

/// Largest CSV blob accepted by a single import (5 MiB)
pub const MAX_IMPORT_SIZE: usize = 5 * 1024 * 1024;

/// Timestamp formats accepted for `created_on`, tried in order
const TIMESTAMP_FORMATS: [&str; 2] = ["%d.%m.%Y %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A row that parsed cleanly and awaits reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOperation {
    /// 1-based line number in the input
    pub row: u64,
    pub created_on: NaiveDateTime,
    /// Absolute value; the sign went into `operation_type`
    pub amount: Decimal,
    pub category: CategoryRef,
    pub description: String,
    pub operation_type: OperationType,
}

/// A row that was dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row: u64,
    pub reason: String,
}

/// Result of parsing a CSV blob
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub operations: Vec<ParsedOperation>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedBatch {
    /// Distinct numeric category keys referenced by the batch
    pub fn category_keys(&self) -> BTreeSet<i64> {
        self.operations
            .iter()
            .filter_map(|op| match op.category {
                CategoryRef::Key(key) => Some(key),
                CategoryRef::Name(_) => None,
            })
            .collect()
    }

    /// Distinct category names with the type of the first row naming them
    pub fn category_names(&self) -> Vec<(String, OperationType)> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();

        for op in &self.operations {
            if let CategoryRef::Name(name) = &op.category {
                if seen.insert(name.as_str()) {
                    names.push((name.clone(), op.operation_type));
                }
            }
        }

        names
    }
}

/// Outcome of a bulk import: what was persisted and what was dropped
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub operations: Vec<Operation>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse a CSV blob into operations, collecting unreadable rows instead of failing
pub fn parse_operations(data: &str) -> ParsedBatch {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data.as_bytes());

    let mut batch = ParsedBatch::default();
    let mut record = StringRecord::new();

    loop {
        let row = rdr.position().line();
        match rdr.read_record(&mut record) {
            Ok(true) => {
                let row = record.position().map(|p| p.line()).unwrap_or(row);
                match parse_row(&record) {
                    Ok(mut op) => {
                        op.row = row;
                        batch.operations.push(op);
                    }
                    Err(reason) => {
                        debug!(row, %reason, "Skipping import row");
                        batch.skipped.push(SkippedRow { row, reason });
                    }
                }
            }
            Ok(false) => break,
            Err(e) => {
                // Broken quoting or invalid UTF-8; the reader cannot resync, stop here
                debug!(row, error = %e, "Stopping import at unreadable row");
                batch.skipped.push(SkippedRow {
                    row,
                    reason: format!("unreadable row: {}", e),
                });
                break;
            }
        }
    }

    debug!(
        parsed = batch.operations.len(),
        skipped = batch.skipped.len(),
        "Parsed import batch"
    );
    batch
}

fn parse_row(record: &StringRecord) -> Result<ParsedOperation, String> {
    if record.len() != 4 {
        return Err(format!(
            "wrong number of fields: expected 4, got {}",
            record.len()
        ));
    }

    let amount = parse_amount(&record[1])?;
    let created_on = parse_timestamp(&record[0])?;

    let raw_category = &record[2];
    if raw_category.is_empty() {
        return Err("missing category".to_string());
    }
    if raw_category.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "category name too long: more than {} characters",
            MAX_NAME_LEN
        ));
    }

    let operation_type = OperationType::from_signed(amount);

    Ok(ParsedOperation {
        row: 0,
        created_on,
        amount: amount.abs(),
        category: CategoryRef::parse(raw_category),
        description: record[3].to_string(),
        operation_type,
    })
}

/// Parse an amount, accepting a comma as decimal separator
pub fn parse_amount(s: &str) -> Result<Decimal, String> {
    let normalized = s.trim().replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| format!("invalid amount '{}'", s))
}

/// Parse a timestamp in `DD.MM.YYYY HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }

    Err(format!("invalid timestamp '{}'", s))
}
