use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::{Transaction, parse_date};
use chrono::NaiveDate;
use rusqlite::Connection;

/// An inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::validation(
                "Invalid range: start date must be on or before end date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn from_strs(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }
}

/// Accepts `YYYY-MM-DD..YYYY-MM-DD` or `YYYY-MM-DD,YYYY-MM-DD`.
pub fn parse_date_range(input: &str) -> Result<DateRange> {
    let s = input.trim();
    let (left, right) = s
        .split_once("..")
        .or_else(|| s.split_once(','))
        .ok_or_else(|| Error::validation("Invalid date range. Use YYYY-MM-DD..YYYY-MM-DD"))?;

    if left.trim().is_empty() || right.trim().is_empty() {
        return Err(Error::validation(
            "Please enter both a start and an end date.",
        ));
    }
    DateRange::from_strs(left, right)
}

/// Every transaction, or only those inside `range` when one is given.
pub fn list_transactions_db(conn: &Connection, range: Option<DateRange>) -> Result<Vec<Transaction>> {
    match range {
        Some(range) => repository::get_transactions_in_range(conn, range.start, range.end),
        None => repository::get_all_transactions(conn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::operations::add::{add_transaction_to_db, create_transaction};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_dotted_range() {
        let range = parse_date_range("2025-01-01..2025-01-31").unwrap();
        assert_eq!(range.start, date("2025-01-01"));
        assert_eq!(range.end, date("2025-01-31"));
    }

    #[test]
    fn test_parse_comma_range_with_spaces() {
        let range = parse_date_range(" 2025-01-01 , 2025-01-31 ").unwrap();
        assert_eq!(range.end, date("2025-01-31"));
    }

    #[test]
    fn test_parse_single_day_range() {
        let range = parse_date_range("2025-01-01..2025-01-01").unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_parse_reversed_range_rejected() {
        let err = parse_date_range("2025-02-01..2025-01-01").unwrap_err();
        assert!(err.to_string().contains("start date"));
    }

    #[test]
    fn test_parse_missing_end_rejected() {
        let err = parse_date_range("2025-02-01..").unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(parse_date_range("last week").is_err());
        assert!(parse_date_range("2025-02-30..2025-03-01").is_err());
    }

    #[test]
    fn test_list_with_and_without_range() {
        let conn = establish_test_connection().unwrap();
        for line in [
            "2024-01-01,expense,Food,1",
            "2024-02-01,expense,Food,2",
            "2024-03-01,income,Salary,3",
        ] {
            add_transaction_to_db(&conn, &create_transaction(line).unwrap()).unwrap();
        }

        assert_eq!(list_transactions_db(&conn, None).unwrap().len(), 3);

        let range = parse_date_range("2024-01-15..2024-03-01").unwrap();
        let filtered = list_transactions_db(&conn, Some(range)).unwrap();
        let dates: Vec<NaiveDate> = filtered.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date("2024-03-01"), date("2024-02-01")]);
    }
}
