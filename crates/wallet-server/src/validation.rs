//! Request validation helpers
//!
//! Each `validate_*` function takes the raw request value and returns the
//! cleaned value or a 422 `AppError`. Handlers call them before touching the
//! database.

use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;

use crate::AppError;
use wallet_core::{parse_month, DEFAULT_PAGE_LIMIT, MAX_NAME_LEN, MAX_PAGE_LIMIT};

pub const MIN_LOGIN_LEN: usize = 3;
pub const MAX_LOGIN_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trim a name and check it is non-empty and at most 255 characters
pub fn validate_name(field: &str, raw: &str) -> Result<String, AppError> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(AppError::unprocessable(&format!("{} must not be empty", field)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::unprocessable(&format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }

    Ok(name.to_string())
}

pub fn validate_login(raw: &str) -> Result<String, AppError> {
    let login = raw.trim();
    let len = login.chars().count();

    if !(MIN_LOGIN_LEN..=MAX_LOGIN_LEN).contains(&len) {
        return Err(AppError::unprocessable(&format!(
            "login must be between {} and {} characters",
            MIN_LOGIN_LEN, MAX_LOGIN_LEN
        )));
    }

    Ok(login.to_string())
}

pub fn validate_password(raw: &str) -> Result<(), AppError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::unprocessable(&format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Accept an amount given as a JSON string or number; it must not be negative
pub fn validate_amount(raw: &serde_json::Value) -> Result<Decimal, AppError> {
    let text = match raw {
        serde_json::Value::String(s) => s.trim().replace(',', "."),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(AppError::unprocessable("amount must be a string or a number")),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AppError::unprocessable(&format!("invalid amount '{}'", text)))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::unprocessable(
            "amount must not be negative, use the operation type for direction",
        ));
    }

    Ok(amount)
}

/// Parse an ISO 8601 timestamp (`YYYY-MM-DDTHH:MM:SS`).
///
/// Operations are stored to the second, so fractional seconds are dropped here.
pub fn validate_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    let ts = NaiveDateTime::from_str(raw.trim())
        .map_err(|_| AppError::unprocessable(&format!("invalid timestamp '{}'", raw)))?;
    Ok(ts.with_nanosecond(0).unwrap_or(ts))
}

pub fn validate_month(raw: &str) -> Result<chrono::NaiveDate, AppError> {
    parse_month(raw).map_err(AppError::from)
}

/// Resolve `limit`/`offset` query values to a bounded page
pub fn validate_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
