use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::TransactionInput;
use rusqlite::Connection;
use std::fs::File;
use std::path::Path;
use tracing::info;

const EXPECTED_COLUMNS: usize = 5;

/// Imports a headerless CSV of `date,kind,category,amount,description` rows.
///
/// The whole file is validated first; rows are then inserted in one SQLite
/// transaction, so a bad line leaves the store untouched.
pub fn import_transactions_to_db(conn: &Connection, path: &Path) -> Result<usize> {
    let inputs = read_csv(path)?;
    let ids = repository::add_transactions(conn, &inputs)?;
    info!("Imported {} transactions from {}", ids.len(), path.display());
    Ok(ids.len())
}

fn read_csv(path: &Path) -> Result<Vec<TransactionInput>> {
    let file = File::open(path).map_err(|e| {
        Error::validation(format!("Failed to open file '{}': {}", path.display(), e))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut inputs = Vec::new();
    for (line_index, result) in reader.records().enumerate() {
        let line = line_index + 1;
        let record = result?;

        if record.len() != EXPECTED_COLUMNS {
            return Err(Error::validation(format!(
                "Invalid number of columns on line {}: expected {}, got {}",
                line,
                EXPECTED_COLUMNS,
                record.len()
            )));
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        let input = TransactionInput::parse(field(0), field(1), field(2), field(3), field(4))
            .map_err(|e| Error::validation(format!("Line {}: {}", line, e)))?;
        inputs.push(input);
    }

    Ok(inputs)
}
