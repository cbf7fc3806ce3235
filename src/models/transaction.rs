use crate::error::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 50;
/// Largest amount a single transaction may carry (one quadrillion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Categories offered by the input form. Any other label is accepted too.
pub const CATEGORY_SUGGESTIONS: [&str; 6] =
    ["Food", "Rent", "Salary", "Transport", "Entertainment", "Other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The lowercase form stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            TransactionKind::Income => TransactionKind::Expense,
            TransactionKind::Expense => TransactionKind::Income,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(Error::validation(format!(
                "Invalid transaction type '{}'. Use 'income' or 'expense'.",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
}

impl Transaction {
    #[cfg(test)]
    pub fn from_input(id: i64, input: TransactionInput) -> Self {
        Self {
            id,
            date: input.date,
            kind: input.kind,
            category: input.category,
            amount: input.amount,
            description: input.description,
        }
    }

    #[cfg(test)]
    pub fn to_input(&self) -> TransactionInput {
        TransactionInput {
            date: self.date,
            kind: self.kind,
            category: self.category.clone(),
            amount: self.amount,
            description: self.description.clone(),
        }
    }
}

/// Every user-supplied field of a transaction, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
}

impl TransactionInput {
    pub fn parse(
        date: &str,
        kind: &str,
        category: &str,
        amount: &str,
        description: &str,
    ) -> Result<Self> {
        let date = parse_date(date)?;
        let kind = kind.parse::<TransactionKind>()?;
        let amount = parse_amount(amount)?;

        let category = category.trim().to_string();
        if category.is_empty() {
            return Err(Error::validation("Category cannot be empty"));
        }
        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(Error::validation(format!(
                "Category too long (max {} characters)",
                MAX_CATEGORY_LEN
            )));
        }

        let description = description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::validation(format!(
                "Description too long (max {} characters)",
                MAX_DESCRIPTION_LEN
            )));
        }

        Ok(Self {
            date,
            kind,
            category,
            amount,
            description,
        })
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::validation("Date is required"));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| Error::validation(format!("Invalid date '{}'. Use YYYY-MM-DD.", s)))
}

pub fn parse_amount(s: &str) -> Result<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::validation("Amount is required"));
    }
    let amount = Decimal::from_str(s).map_err(|_| {
        Error::validation(format!(
            "Invalid amount '{}'. Please provide a valid decimal number.",
            s
        ))
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation("Amount cannot be negative"));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::validation(format!(
            "Amount too large (max {})",
            MAX_AMOUNT
        )));
    }
    Ok(amount)
}
