//! Wallet Core Library
//!
//! Shared functionality for the Wallet personal finance tracker:
//! - Database access and migrations
//! - Monthly balance aggregation per account
//! - Bulk CSV import of operations with category reconciliation
//! - Password hashing for user credentials

pub mod auth;
pub mod balance;
pub mod db;
pub mod error;
pub mod import;
pub mod models;

pub use balance::{aggregate, monthly_balances, month_bounds, month_start, parse_month};
pub use db::Database;
pub use error::{Error, Result};
pub use import::{parse_operations, ImportReport, ParsedBatch, SkippedRow, MAX_IMPORT_SIZE};
pub use models::{DEFAULT_PAGE_LIMIT, MAX_NAME_LEN, MAX_PAGE_LIMIT};
