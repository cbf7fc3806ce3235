use crate::error::{Error, Result};
use crate::models::transaction::{DATE_FORMAT, Transaction, TransactionInput, parse_amount};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT id, date, kind, category, amount, description FROM transactions";

/// Inserts a new row and returns the id assigned by SQLite.
pub fn add_transaction(conn: &Connection, input: &TransactionInput) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (date, kind, category, amount, description) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.date.format(DATE_FORMAT).to_string(),
            input.kind.as_str(),
            &input.category,
            input.amount.to_string(),
            &input.description,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!("Inserted transaction {}", id);
    Ok(id)
}

/// Inserts every input inside a single SQLite transaction: either all rows land or none do.
pub fn add_transactions(conn: &Connection, inputs: &[TransactionInput]) -> Result<Vec<i64>> {
    let tx = conn.unchecked_transaction()?;
    let mut ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        ids.push(add_transaction(&tx, input)?);
    }
    tx.commit()?;
    Ok(ids)
}

/// All rows, newest date first. Rows sharing a date come back newest-inserted first.
pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY date DESC, id DESC", SELECT_COLUMNS))?;
    let rows = stmt.query_map([], row_to_transaction)?;
    let transactions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    debug!("Loaded {} transactions", transactions.len());
    Ok(transactions)
}

/// Rows with `start <= date <= end`, ordered like [`get_all_transactions`].
///
/// ISO dates compare lexicographically in the same order as calendar dates,
/// so the filter runs on the stored text directly.
pub fn get_transactions_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE date >= ?1 AND date <= ?2 ORDER BY date DESC, id DESC",
        SELECT_COLUMNS
    ))?;
    let rows = stmt.query_map(
        params![
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string()
        ],
        row_to_transaction,
    )?;
    let transactions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(
        "Loaded {} transactions between {} and {}",
        transactions.len(),
        start,
        end
    );
    Ok(transactions)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let transaction = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            [id],
            row_to_transaction,
        )
        .optional()?;
    Ok(transaction)
}

/// Replaces every field of row `id`.
pub fn update_transaction(conn: &Connection, id: i64, input: &TransactionInput) -> Result<()> {
    let rows_affected = conn.execute(
        "UPDATE transactions SET date = ?1, kind = ?2, category = ?3, amount = ?4, description = ?5 WHERE id = ?6",
        params![
            input.date.format(DATE_FORMAT).to_string(),
            input.kind.as_str(),
            &input.category,
            input.amount.to_string(),
            &input.description,
            id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound(id));
    }
    debug!("Updated transaction {}", id);
    Ok(())
}

pub fn remove_transaction(conn: &Connection, id: i64) -> Result<()> {
    let rows_affected = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound(id));
    }
    debug!("Deleted transaction {}", id);
    Ok(())
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    let kind_str: String = row.get(2)?;
    let amount_str: String = row.get(4)?;

    Ok(Transaction {
        id: row.get(0)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| conversion_error(1, e))?,
        kind: kind_str.parse().map_err(|e| conversion_error(2, e))?,
        category: row.get(3)?,
        amount: parse_amount(&amount_str).map_err(|e| conversion_error(4, e))?,
        description: row.get(5)?,
    })
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::models::transaction::TransactionKind;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn create_test_input(date: &str, kind: TransactionKind, category: &str, amount: &str) -> TransactionInput {
        TransactionInput {
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            kind,
            category: category.to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            description: "Test Transaction".to_string(),
        }
    }

    #[test]
    fn test_add_then_list_end_to_end() {
        let conn = establish_test_connection().unwrap();
        let input = TransactionInput {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            kind: TransactionKind::Expense,
            category: "Food".to_string(),
            amount: Decimal::new(1250, 2),
            description: "lunch".to_string(),
        };

        let id = add_transaction(&conn, &input).unwrap();
        assert_eq!(id, 1);

        let all = get_all_transactions(&conn).unwrap();
        assert_eq!(all, vec![Transaction::from_input(1, input)]);
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let conn = establish_test_connection().unwrap();
        let a = add_transaction(&conn, &create_test_input("2024-01-01", TransactionKind::Income, "Salary", "100")).unwrap();
        let b = add_transaction(&conn, &create_test_input("2024-01-01", TransactionKind::Income, "Salary", "100")).unwrap();
        assert_ne!(a, b);

        let all = get_all_transactions(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|t| t.id == a).count(), 1);
        assert_eq!(all.iter().filter(|t| t.id == b).count(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let conn = establish_test_connection().unwrap();
        let first = add_transaction(&conn, &create_test_input("2024-01-01", TransactionKind::Expense, "Food", "1")).unwrap();
        remove_transaction(&conn, first).unwrap();
        let second = add_transaction(&conn, &create_test_input("2024-01-01", TransactionKind::Expense, "Food", "1")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_get_all_transactions_empty() {
        let conn = establish_test_connection().unwrap();
        assert!(get_all_transactions(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_get_all_orders_by_date_desc_then_newest_insert() {
        let conn = establish_test_connection().unwrap();
        let old = add_transaction(&conn, &create_test_input("2024-01-01", TransactionKind::Expense, "Food", "1")).unwrap();
        let same_day_first = add_transaction(&conn, &create_test_input("2024-02-01", TransactionKind::Expense, "Food", "2")).unwrap();
        let same_day_second = add_transaction(&conn, &create_test_input("2024-02-01", TransactionKind::Expense, "Rent", "3")).unwrap();

        let ids: Vec<i64> = get_all_transactions(&conn).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![same_day_second, same_day_first, old]);
    }

    #[test]
    fn test_range_matches_filtered_full_list() {
        let conn = establish_test_connection().unwrap();
        for date in ["2023-12-31", "2024-01-01", "2024-01-15", "2024-01-31", "2024-02-01"] {
            add_transaction(&conn, &create_test_input(date, TransactionKind::Expense, "Food", "5")).unwrap();
        }
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let expected: Vec<Transaction> = get_all_transactions(&conn)
            .unwrap()
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect();
        let ranged = get_transactions_in_range(&conn, start, end).unwrap();

        assert_eq!(ranged.len(), 3);
        assert_eq!(ranged, expected);
        assert!(ranged.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_range_without_matches_is_empty() {
        let conn = establish_test_connection().unwrap();
        add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5")).unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert!(get_transactions_in_range(&conn, start, end).unwrap().is_empty());

        // Reversed bounds simply match nothing.
        assert!(get_transactions_in_range(&conn, end, start).unwrap().is_empty());
    }

    #[test]
    fn test_get_transaction_by_id() {
        let conn = establish_test_connection().unwrap();
        let id = add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5")).unwrap();

        assert_eq!(get_transaction(&conn, id).unwrap().unwrap().category, "Salary");
        assert!(get_transaction(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_update_replaces_all_fields_only_for_target() {
        let conn = establish_test_connection().unwrap();
        let target = add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5")).unwrap();
        let other = add_transaction(&conn, &create_test_input("2024-01-16", TransactionKind::Expense, "Food", "7")).unwrap();
        let other_before = get_transaction(&conn, other).unwrap().unwrap();

        let replacement = TransactionInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: TransactionKind::Expense,
            category: "Rent".to_string(),
            amount: Decimal::new(99999, 2),
            description: "march rent".to_string(),
        };
        update_transaction(&conn, target, &replacement).unwrap();

        assert_eq!(
            get_transaction(&conn, target).unwrap().unwrap(),
            Transaction::from_input(target, replacement)
        );
        assert_eq!(get_transaction(&conn, other).unwrap().unwrap(), other_before);
    }

    #[test]
    fn test_update_not_found() {
        let conn = establish_test_connection().unwrap();
        let input = create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5");
        let result = update_transaction(&conn, 42, &input);
        assert!(matches!(result, Err(Error::NotFound(42))));
        assert!(get_all_transactions(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_remove_transaction_success() {
        let conn = establish_test_connection().unwrap();
        let keep = add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5")).unwrap();
        let gone = add_transaction(&conn, &create_test_input("2024-01-16", TransactionKind::Expense, "Food", "7")).unwrap();

        remove_transaction(&conn, gone).unwrap();

        let all = get_all_transactions(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep);
    }

    #[test]
    fn test_remove_transaction_not_found_leaves_others() {
        let conn = establish_test_connection().unwrap();
        add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5")).unwrap();

        let result = remove_transaction(&conn, 999);
        assert!(matches!(result, Err(Error::NotFound(999))));
        assert!(result.unwrap_err().to_string().contains("not found"));
        assert_eq!(get_all_transactions(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_add_transactions_inserts_every_row() {
        let conn = establish_test_connection().unwrap();
        let inputs = vec![
            create_test_input("2024-01-15", TransactionKind::Income, "Salary", "5"),
            create_test_input("2024-01-16", TransactionKind::Expense, "Food", "7"),
        ];
        let ids = add_transactions(&conn, &inputs).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(get_all_transactions(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_add_transactions_rolls_back_on_failure() {
        let conn = establish_test_connection().unwrap();
        conn.execute(
            "CREATE TRIGGER reject_rent BEFORE INSERT ON transactions WHEN NEW.category = 'Rent' BEGIN SELECT RAISE(ABORT, 'rent rejected'); END",
            [],
        )
        .unwrap();

        let inputs = vec![
            create_test_input("2024-01-15", TransactionKind::Expense, "Food", "5"),
            create_test_input("2024-01-16", TransactionKind::Expense, "Rent", "7"),
        ];
        let result = add_transactions(&conn, &inputs);

        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(get_all_transactions(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_amount_keeps_exact_decimal_value() {
        let conn = establish_test_connection().unwrap();
        let id = add_transaction(&conn, &create_test_input("2024-01-15", TransactionKind::Expense, "Food", "0.10")).unwrap();
        let stored = get_transaction(&conn, id).unwrap().unwrap();
        assert_eq!(stored.amount, Decimal::new(10, 2));
    }

    #[test]
    fn test_out_of_range_stored_amount_is_a_storage_error() {
        let conn = establish_test_connection().unwrap();
        conn.execute(
            "INSERT INTO transactions (date, kind, category, amount, description) VALUES ('2024-01-01', 'income', 'Salary', '79228162514264337593543950335', '')",
            [],
        )
        .unwrap();

        assert!(matches!(get_all_transactions(&conn), Err(Error::Storage(_))));
    }
}
