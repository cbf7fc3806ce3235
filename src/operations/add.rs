use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::TransactionInput;
use rusqlite::Connection;
use tracing::info;

/// Parses `date, kind, category, amount, description`.
///
/// The description is the last field and may itself contain commas.
pub fn create_transaction(raw: &str) -> Result<TransactionInput> {
    let parts: Vec<&str> = raw.trim().splitn(5, ',').map(|s| s.trim()).collect();
    if parts.len() < 4 {
        return Err(Error::validation(format!(
            "Invalid number of details provided. Expected date, type, category, amount[, description] but got {} field(s)",
            parts.len()
        )));
    }
    let description = parts.get(4).copied().unwrap_or("");
    TransactionInput::parse(parts[0], parts[1], parts[2], parts[3], description)
}

pub fn add_transaction_to_db(conn: &Connection, input: &TransactionInput) -> Result<i64> {
    let id = repository::add_transaction(conn, input)?;
    info!(
        "Recorded {} of {} in '{}' on {} as #{}",
        input.kind.as_str(),
        input.amount,
        input.category,
        input.date,
        id
    );
    Ok(id)
}

/// Turns user-typed id text into a row id.
pub fn parse_transaction_id(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation("Transaction ID cannot be empty."));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::validation(format!(
            "Invalid transaction ID '{}'. Please provide a positive whole number.",
            raw
        ))),
    }
}
