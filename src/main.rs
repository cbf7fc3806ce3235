mod args;
mod db;
mod error;
mod logging;
mod models;
mod operations;

use args::{Args, Command};
use clap::Parser;
use error::Result;
use models::transaction::{DATE_FORMAT, Transaction};
use operations::add::{add_transaction_to_db, create_transaction};
use operations::app::run_app;
use operations::chart::run_chart;
use operations::edit::update_transaction_db;
use operations::export::export_transactions;
use operations::filter::{DateRange, list_transactions_db};
use operations::import::import_transactions_to_db;
use operations::pdf_report::save_report;
use operations::remove::remove_transaction_from_db;
use operations::summary::{expense_breakdown_by_category, format_amount, summarize};
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    let args = Args::parse();
    let interactive = args.is_interactive();
    let silent = interactive && args.log_file().is_none();

    if let Err(e) = logging::init_logger(args.log_level(), args.log_file(), interactive) {
        eprintln!("Failed to set up logging: {}", e);
        return ExitCode::FAILURE;
    }
    debug!("{:?}", args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if silent {
                eprintln!("Error: {}", e);
            } else {
                error!("Exiting with error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    // One connection for the whole run, closed when it drops at the end of this function.
    let conn = db::connection::establish_connection(args.db())?;

    match args.command() {
        Command::Tui { report_dir } => run_app(&conn, report_dir)?,
        Command::Add(fields) => {
            let id = add_transaction_to_db(&conn, &fields.to_input()?)?;
            println!("Transaction added with ID {}.", id);
        }
        Command::Quick { entry } => {
            let id = add_transaction_to_db(&conn, &create_transaction(&entry)?)?;
            println!("Transaction added with ID {}.", id);
        }
        Command::List { from, to } => {
            let range = optional_range(from.as_deref(), to.as_deref())?;
            let transactions = list_transactions_db(&conn, range)?;
            if transactions.is_empty() {
                println!("No transactions found.");
            } else {
                print_transactions(&transactions);
            }
        }
        Command::Update { id, fields } => {
            let id = update_transaction_db(&conn, &id, &fields.to_input()?)?;
            println!("Transaction ID {} updated.", id);
        }
        Command::Delete { id } => {
            let id = remove_transaction_from_db(&conn, &id)?;
            println!("Transaction ID {} deleted.", id);
        }
        Command::Summary { from, to } => {
            let range = optional_range(from.as_deref(), to.as_deref())?;
            print_summary(&list_transactions_db(&conn, range)?);
        }
        Command::Chart => run_chart(&conn)?,
        Command::Report { output, report_dir } => {
            let path = save_report(&conn, output.as_deref(), &report_dir)?;
            println!("PDF report saved as: {}", path.display());
        }
        Command::Import { file } => {
            let count = import_transactions_to_db(&conn, &file)?;
            println!("Successfully imported {} transactions.", count);
        }
        Command::Export { file } => {
            let count = export_transactions(&conn, &file)?;
            println!("Exported {} transactions to {}.", count, file.display());
        }
    }
    Ok(())
}

fn optional_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(Some(DateRange::from_strs(from, to)?)),
        _ => Ok(None),
    }
}

fn print_transactions(transactions: &[Transaction]) {
    println!(
        "{:>5}  {:10}  {:8}  {:15}  {:>12}  {}",
        "ID", "Date", "Type", "Category", "Amount", "Description"
    );
    for t in transactions {
        println!(
            "{:>5}  {:10}  {:8}  {:15}  {:>12}  {}",
            t.id,
            t.date.format(DATE_FORMAT).to_string(),
            t.kind.label(),
            t.category,
            format_amount(t.amount),
            t.description
        );
    }
}

fn print_summary(transactions: &[Transaction]) {
    let summary = summarize(transactions);
    println!("Total Income:  {:>12}", format_amount(summary.total_income));
    println!("Total Expense: {:>12}", format_amount(summary.total_expense));
    println!("Net Balance:   {:>12}", format_amount(summary.net_balance));

    let breakdown = expense_breakdown_by_category(transactions);
    if !breakdown.is_empty() {
        println!();
        println!("Expenses by category:");
        for (category, amount) in &breakdown {
            println!("  {:15} {:>12}", category, format_amount(*amount));
        }
    }
}
