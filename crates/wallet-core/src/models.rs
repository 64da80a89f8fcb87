//! Domain models for Wallet

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};

/// Render money with two decimal places.
///
/// Amounts are kept at full precision internally; rounding only happens here.
pub fn serialize_money<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    serializer.serialize_str(&format!("{:.2}", rounded))
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An account owned by a user (bank card, cash, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Direction of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Income,
    #[default]
    Expense,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Negative amounts are expenses, everything else is income
    pub fn from_signed(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            Self::Expense
        } else {
            Self::Income
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown operation type: {}", s)),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A category owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: OperationType,
    pub created_at: DateTime<Utc>,
}

/// A dated monetary movement tied to one account and one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub id: i64,
    pub account_id: i64,
    pub category: Category,
    /// Non-negative magnitude; `operation_type` carries the direction
    #[serde(serialize_with = "serialize_money")]
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub created_on: NaiveDateTime,
}

/// Operation ready to be persisted (keys already validated)
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub operation_type: OperationType,
    pub created_on: NaiveDateTime,
}

/// How an imported row refers to its category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryRef {
    /// Key of an existing category
    Key(i64),
    /// Free-text name, resolved or created on import
    Name(String),
}

impl CategoryRef {
    /// Integers are keys, anything else is a name
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(key) => Self::Key(key),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

/// Derived monthly aggregate for an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    /// First day of the month
    pub month: NaiveDate,
    #[serde(serialize_with = "serialize_money")]
    pub incomes: Decimal,
    #[serde(serialize_with = "serialize_money")]
    pub expenses: Decimal,
    #[serde(serialize_with = "serialize_money")]
    pub rest: Decimal,
}

impl Balance {
    pub fn empty(month: NaiveDate) -> Self {
        Self {
            month,
            incomes: Decimal::ZERO,
            expenses: Decimal::ZERO,
            rest: Decimal::ZERO,
        }
    }
}

/// Page size used when a listing does not ask for one
/// Longest account or category name, in characters
pub const MAX_NAME_LEN: usize = 255;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest page a listing will return
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Filters for listing operations. Always scoped to one user.
#[derive(Debug, Clone)]
pub struct OperationFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Restrict to the month starting at this date
    pub month: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for OperationFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            category_id: None,
            month: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_operation_type_from_signed() {
        assert_eq!(
            OperationType::from_signed(Decimal::from_str("-150.50").unwrap()),
            OperationType::Expense
        );
        assert_eq!(
            OperationType::from_signed(Decimal::from_str("1000").unwrap()),
            OperationType::Income
        );
        assert_eq!(
            OperationType::from_signed(Decimal::from_str("-0.00").unwrap()),
            OperationType::Income
        );
    }

    #[test]
    fn test_category_ref_parse() {
        assert_eq!(CategoryRef::parse("2"), CategoryRef::Key(2));
        assert_eq!(CategoryRef::parse("Food"), CategoryRef::Name("Food".into()));
        assert_eq!(CategoryRef::parse("2a"), CategoryRef::Name("2a".into()));
    }

    #[test]
    fn test_money_serialization_rounds() {
        let balance = Balance {
            month: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            incomes: Decimal::from_str("10.005").unwrap(),
            expenses: Decimal::from_str("3").unwrap(),
            rest: Decimal::from_str("7.005").unwrap(),
        };
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json["month"], "2021-03-01");
        assert_eq!(json["incomes"], "10.01");
        assert_eq!(json["expenses"], "3.00");
        assert_eq!(json["rest"], "7.01");
    }
}
