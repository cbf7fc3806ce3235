use super::add::parse_transaction_id;
use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::TransactionInput;
use rusqlite::Connection;
use tracing::info;

pub fn update_transaction_db(conn: &Connection, id_input: &str, input: &TransactionInput) -> Result<i64> {
    let id = parse_transaction_id(id_input)?;
    let before = repository::get_transaction(conn, id)?.ok_or(Error::NotFound(id))?;
    repository::update_transaction(conn, id, input)?;
    info!(
        "Updated transaction #{}: {} {} in '{}' -> {} {} in '{}'",
        id,
        before.kind.as_str(),
        before.amount,
        before.category,
        input.kind.as_str(),
        input.amount,
        input.category
    );
    Ok(id)
}
