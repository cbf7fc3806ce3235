//! Totals over an in-memory set of transactions.

use crate::models::transaction::{Transaction, TransactionKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
}

/// One category's slice of total expense.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    /// Percentage of total expense, 0 to 100.
    pub percent: f64,
}

/// Formats a monetary value with exactly two decimals, rounding halves away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => total_income += transaction.amount,
            TransactionKind::Expense => total_expense += transaction.amount,
        }
    }

    Summary {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
    }
}

/// Sums expense amounts per category. Income rows never contribute, and a
/// category with no expense rows has no entry.
pub fn expense_breakdown_by_category(transactions: &[Transaction]) -> BTreeMap<String, Decimal> {
    let mut breakdown = BTreeMap::new();
    for transaction in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        *breakdown
            .entry(transaction.category.clone())
            .or_insert(Decimal::ZERO) += transaction.amount;
    }
    breakdown
}

/// Largest category first; ties keep alphabetical order.
pub fn category_shares(breakdown: &BTreeMap<String, Decimal>) -> Vec<CategoryShare> {
    let total: Decimal = breakdown.values().copied().sum();
    if total <= Decimal::ZERO {
        return Vec::new();
    }

    let mut shares: Vec<CategoryShare> = breakdown
        .iter()
        .map(|(category, amount)| {
            let ratio = *amount / total * Decimal::ONE_HUNDRED;
            CategoryShare {
                category: category.clone(),
                amount: *amount,
                percent: ratio.to_f64().unwrap_or(0.0),
            }
        })
        .collect();
    // sort_by is stable, so equal amounts stay in BTreeMap (alphabetical) order
    shares.sort_by(|a, b| b.amount.cmp(&a.amount));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_transaction(id: i64, kind: TransactionKind, category: &str, amount: i64) -> Transaction {
        Transaction {
            id,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            kind,
            category: category.to_string(),
            amount: Decimal::from(amount),
            description: String::new(),
        }
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(
            summarize(&[]),
            Summary {
                total_income: Decimal::ZERO,
                total_expense: Decimal::ZERO,
                net_balance: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_summarize_income_and_expense() {
        let transactions = vec![
            create_test_transaction(1, TransactionKind::Income, "Salary", 100),
            create_test_transaction(2, TransactionKind::Expense, "Food", 40),
        ];
        let summary = summarize(&transactions);
        assert_eq!(summary.total_income, Decimal::from(100));
        assert_eq!(summary.total_expense, Decimal::from(40));
        assert_eq!(summary.net_balance, Decimal::from(60));
    }

    #[test]
    fn test_summarize_negative_balance() {
        let transactions = vec![
            create_test_transaction(1, TransactionKind::Income, "Salary", 10),
            create_test_transaction(2, TransactionKind::Expense, "Rent", 25),
        ];
        assert_eq!(summarize(&transactions).net_balance, Decimal::from(-15));
    }

    #[test]
    fn test_summarize_decimal_sums_do_not_drift() {
        let mut transactions = Vec::new();
        for id in 0..10 {
            let mut t = create_test_transaction(id, TransactionKind::Expense, "Food", 0);
            t.amount = Decimal::new(10, 2);
            transactions.push(t);
        }
        assert_eq!(summarize(&transactions).total_expense, Decimal::ONE);
    }

    #[test]
    fn test_breakdown_groups_expenses_and_skips_income() {
        let transactions = vec![
            create_test_transaction(1, TransactionKind::Expense, "Food", 30),
            create_test_transaction(2, TransactionKind::Expense, "Food", 20),
            create_test_transaction(3, TransactionKind::Expense, "Rent", 50),
            create_test_transaction(4, TransactionKind::Income, "Food", 1000),
        ];

        let breakdown = expense_breakdown_by_category(&transactions);

        let expected: BTreeMap<String, Decimal> = [
            ("Food".to_string(), Decimal::from(50)),
            ("Rent".to_string(), Decimal::from(50)),
        ]
        .into_iter()
        .collect();
        assert_eq!(breakdown, expected);
    }

    #[test]
    fn test_breakdown_omits_income_only_categories() {
        let transactions = vec![create_test_transaction(1, TransactionKind::Income, "Salary", 300)];
        assert!(expense_breakdown_by_category(&transactions).is_empty());
    }

    #[test]
    fn test_category_shares_percentages() {
        let transactions = vec![
            create_test_transaction(1, TransactionKind::Expense, "Food", 25),
            create_test_transaction(2, TransactionKind::Expense, "Rent", 75),
        ];
        let shares = category_shares(&expense_breakdown_by_category(&transactions));

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "Rent");
        assert!((shares[0].percent - 75.0).abs() < 1e-9);
        assert_eq!(shares[1].category, "Food");
        assert!((shares[1].percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_shares_ties_stay_alphabetical() {
        let transactions = vec![
            create_test_transaction(1, TransactionKind::Expense, "Rent", 50),
            create_test_transaction(2, TransactionKind::Expense, "Food", 50),
        ];
        let shares = category_shares(&expense_breakdown_by_category(&transactions));
        let names: Vec<&str> = shares.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Rent"]);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from(1000)), "1000.00");
        assert_eq!(format_amount(Decimal::new(125, 1)), "12.50");
        assert_eq!(format_amount(Decimal::new(400125, 3)), "400.13");
        assert_eq!(format_amount(Decimal::new(-15, 0)), "-15.00");
    }

    #[test]
    fn test_summarize_largest_accepted_amounts() {
        use crate::db::connection::establish_test_connection;
        use crate::db::repository::get_all_transactions;
        use crate::models::transaction::MAX_AMOUNT;
        use crate::operations::add::{add_transaction_to_db, create_transaction};

        let conn = establish_test_connection().unwrap();
        assert!(create_transaction("2024-01-01,income,Salary,79228162514264337593543950335").is_err());
        for line in [
            "2024-01-01,income,Salary,1000000000000000",
            "2024-01-02,income,Salary,1000000000000000",
            "2024-01-03,expense,Rent,1000000000000000",
            "2024-01-04,expense,Rent,1000000000000000",
        ] {
            add_transaction_to_db(&conn, &create_transaction(line).unwrap()).unwrap();
        }

        let transactions = get_all_transactions(&conn).unwrap();
        let summary = summarize(&transactions);
        assert_eq!(summary.total_income, MAX_AMOUNT * Decimal::TWO);
        assert_eq!(summary.net_balance, Decimal::ZERO);

        let shares = category_shares(&expense_breakdown_by_category(&transactions));
        assert_eq!(shares[0].amount, MAX_AMOUNT * Decimal::TWO);
        assert!((shares[0].percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_shares_empty_without_expenses() {
        assert!(category_shares(&BTreeMap::new()).is_empty());
    }
}
