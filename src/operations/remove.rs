use super::add::parse_transaction_id;
use crate::db::repository;
use crate::error::Result;
use rusqlite::Connection;
use tracing::info;

pub fn remove_transaction_from_db(conn: &Connection, id_input: &str) -> Result<i64> {
    let id = parse_transaction_id(id_input)?;
    repository::remove_transaction(conn, id)?;
    info!("Deleted transaction #{}", id);
    Ok(id)
}
