use rusqlite::{Connection, Result};
use std::path::Path;
use tracing::debug;

const CREATE_TRANSACTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
    category TEXT NOT NULL,
    amount TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
)";

pub fn establish_connection(path: &Path) -> Result<Connection> {
    debug!("Opening database at {}", path.display());
    let conn = Connection::open(path)?;
    initialize(&conn)?;
    Ok(conn)
}

/// Creates the schema when it is missing. Safe to call on every startup.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_TRANSACTIONS_TABLE, [])?;
    Ok(())
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    initialize(&conn)?;
    Ok(conn)
}
