use crate::db::repository;
use crate::error::Result;
use crate::models::transaction::DATE_FORMAT;
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

pub fn export_transactions(conn: &Connection, path: &Path) -> Result<usize> {
    let transactions = repository::get_all_transactions(conn)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "date", "kind", "category", "amount", "description"])?;
    for t in &transactions {
        writer.write_record([
            t.id.to_string(),
            t.date.format(DATE_FORMAT).to_string(),
            t.kind.as_str().to_string(),
            t.category.clone(),
            t.amount.to_string(),
            t.description.clone(),
        ])?;
    }
    writer.flush()?;

    info!("Exported {} transactions to {}", transactions.len(), path.display());
    Ok(transactions.len())
}
