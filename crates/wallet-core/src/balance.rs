//! Monthly balance aggregation
//!
//! Balances are never stored. They are recomputed from the operations whose
//! `created_on` falls inside a calendar month:
//!
//! - `incomes` is the sum of income amounts
//! - `expenses` is the sum of expense amounts
//! - `rest = incomes - expenses`
//!
//! Amounts are stored as non-negative magnitudes, so no sign juggling happens
//! here. All arithmetic is `Decimal`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{Balance, OperationType};

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Half-open `[start, end)` timestamp window covering the month of `month`
pub fn month_bounds(month: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = month_start(month);
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    }
    .unwrap_or(NaiveDate::MAX);

    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default(),
        next.and_hms_opt(0, 0, 0).unwrap_or_default(),
    )
}

/// Parse `YYYY-MM` or `YYYY-MM-DD` into the first day of that month
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(month_start(date));
    }

    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .map_err(|_| Error::InvalidData(format!("Invalid month '{}', expected YYYY-MM", s)))
}

/// Sum amounts into a balance for `month`.
///
/// The caller is responsible for passing only operations from that month.
/// Fails with `InvalidData` when a sum leaves the `Decimal` range.
pub fn aggregate<I>(month: NaiveDate, operations: I) -> Result<Balance>
where
    I: IntoIterator<Item = (Decimal, OperationType)>,
{
    let month = month_start(month);
    let mut balance = Balance::empty(month);

    for (amount, operation_type) in operations {
        let total = match operation_type {
            OperationType::Income => &mut balance.incomes,
            OperationType::Expense => &mut balance.expenses,
        };
        *total = total
            .checked_add(amount)
            .ok_or_else(|| overflow(month, operation_type.as_str()))?;
    }

    balance.rest = balance
        .incomes
        .checked_sub(balance.expenses)
        .ok_or_else(|| overflow(month, "rest"))?;
    Ok(balance)
}

fn overflow(month: NaiveDate, what: &str) -> Error {
    Error::InvalidData(format!(
        "Balance for {} overflows: {} total is out of range",
        month.format("%Y-%m"),
        what
    ))
}

/// Group operations by month and aggregate each one, newest month first
pub fn monthly_balances<I>(operations: I) -> Result<Vec<Balance>>
where
    I: IntoIterator<Item = (NaiveDateTime, Decimal, OperationType)>,
{
    let mut by_month: BTreeMap<NaiveDate, Vec<(Decimal, OperationType)>> = BTreeMap::new();

    for (created_on, amount, operation_type) in operations {
        by_month
            .entry(month_start(created_on.date()))
            .or_default()
            .push((amount, operation_type));
    }

    by_month
        .into_iter()
        .rev()
        .map(|(month, ops)| aggregate(month, ops))
        .collect()
}
