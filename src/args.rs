use crate::error::Result;
use crate::models::transaction::TransactionInput;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Record income and expenses, filter them by date, chart them and export a PDF report.
#[derive(Debug, Parser)]
#[command(name = "xtrack", version, about)]
pub struct Args {
    /// SQLite database file. Created on first use.
    #[arg(long, env = "XTRACK_DB", default_value = "expense_tracker.db", global = true)]
    db: PathBuf,

    /// Log level for this program. `RUST_LOG`, when set, takes precedence.
    #[arg(long, default_value_t = LevelFilter::INFO, global = true)]
    log_level: LevelFilter,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "XTRACK_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Args {
    pub fn db(&self) -> &Path {
        &self.db
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// The terminal UI is the default when no subcommand is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui {
            report_dir: PathBuf::from("."),
        })
    }

    /// Whether the run takes over the terminal screen.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command(), Command::Tui { .. } | Command::Chart)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open the interactive terminal UI.
    Tui {
        /// Directory where PDF reports are saved.
        #[arg(long, default_value = ".")]
        report_dir: PathBuf,
    },
    /// Record a new transaction.
    Add(TransactionFields),
    /// Record a transaction from one line: "date, kind, category, amount[, description]".
    Quick { entry: String },
    /// List transactions, newest first.
    List {
        /// First day of the range (YYYY-MM-DD), inclusive.
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Last day of the range (YYYY-MM-DD), inclusive.
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// Replace every field of an existing transaction.
    Update {
        id: String,
        #[command(flatten)]
        fields: TransactionFields,
    },
    /// Delete a transaction.
    Delete { id: String },
    /// Print total income, total expense, net balance and the expense breakdown.
    Summary {
        #[arg(long, requires = "to")]
        from: Option<String>,
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// Show the expense breakdown chart.
    Chart,
    /// Save the PDF report.
    Report {
        /// Output file. Defaults to Expense_Report_<timestamp>.pdf inside --report-dir.
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        report_dir: PathBuf,
    },
    /// Import a headerless CSV of date,kind,category,amount,description rows.
    Import { file: PathBuf },
    /// Export every transaction to CSV.
    Export { file: PathBuf },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct TransactionFields {
    /// Date of the transaction (YYYY-MM-DD).
    #[arg(long)]
    date: String,
    /// `income` or `expense`.
    #[arg(long, default_value = "expense")]
    kind: String,
    /// Free-form label, e.g. Food, Rent, Salary, Transport, Entertainment, Other.
    #[arg(long)]
    category: String,
    /// Non-negative amount, e.g. 12.50.
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "")]
    description: String,
}

impl TransactionFields {
    pub fn to_input(&self) -> Result<TransactionInput> {
        TransactionInput::parse(
            &self.date,
            &self.kind,
            &self.category,
            &self.amount,
            &self.description,
        )
    }
}
