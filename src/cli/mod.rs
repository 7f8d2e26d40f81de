pub mod add;
pub mod backup;
pub mod categories;
pub mod delete;
pub mod export;
pub mod init;
pub mod list;
pub mod overview;
pub mod report;
pub mod status;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::aggregator::Period;
use crate::db::SqliteKv;
use crate::error::{Result, TallyError};
use crate::models::TransactionType;
use crate::settings::Settings;
use crate::store::TransactionStore;

/// Upper bound for `report monthly --months`.
pub const MAX_REPORT_MONTHS: i64 = 120;

/// Open the transaction store in the configured data directory, creating the
/// directory and database on first use.
pub(crate) fn open_store(settings: &Settings) -> Result<TransactionStore<SqliteKv>> {
    std::fs::create_dir_all(&settings.data_dir)?;
    let store = TransactionStore::open(SqliteKv::open(&settings.db_path())?)?;
    Ok(store)
}

pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| TallyError::InvalidDate(format!("'{raw}' (expected YYYY-MM-DD)")))
}

/// `--date` if given, otherwise today.
pub(crate) fn day_or_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(r) => parse_day(r),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub(crate) fn parse_month_opt(month: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(m) = month else { return Ok(None) };
    NaiveDate::parse_from_str(&format!("{}-01", m.trim()), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| TallyError::InvalidDate(format!("'{m}' (expected YYYY-MM)")))
}

#[derive(Parser)]
#[command(name = "tally", version, about = "Track personal income and expenses.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: data directory, locale, currency and week start.
    Init {
        /// Path for tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Locale tag for numbers and dates, e.g. pt-BR, en-US
        #[arg(long)]
        locale: Option<String>,
        /// Currency code, e.g. BRL, USD, EUR
        #[arg(long)]
        currency: Option<String>,
        /// First day of the week: Sun, Mon, ...
        #[arg(long = "week-start")]
        week_start: Option<String>,
    },
    /// Record income.
    Income(EntryArgs),
    /// Record an expense.
    Expense(EntryArgs),
    /// Delete a transaction by ID.
    Delete {
        /// Transaction ID (shown in `tally list`)
        id: i64,
    },
    /// List transactions, most recent first.
    List {
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Balance and totals for a day, week or month (the default command).
    Overview {
        /// day, week or month
        #[arg(long, default_value = "day")]
        period: Period,
        /// Any date inside the period: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// List income and expense categories.
    Categories,
    /// Export all transactions to CSV.
    Export {
        /// Output file (default: <data_dir>/exports/tally-YYYYMMDD-HHMMSS.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/tally-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show settings, database location and record count.
    Status,
}

#[derive(Args)]
pub struct EntryArgs {
    /// What the money was for
    pub description: String,
    /// Amount, e.g. 120.50 or 120,50
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
    /// Category key or label (see `tally categories`)
    #[arg(long, short)]
    pub category: Option<String>,
    /// Date: YYYY-MM-DD or "YYYY-MM-DD HH:MM" (default: now)
    #[arg(long)]
    pub date: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expense and net for recent months.
    Monthly {
        /// Number of months ending with the current one (1 to 120)
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=MAX_REPORT_MONTHS))]
        months: u16,
    },
    /// Totals per category.
    Categories {
        /// income or expense
        #[arg(long = "type", default_value = "expense")]
        kind: TransactionType,
        /// Month filter: YYYY-MM (default: all time)
        #[arg(long)]
        month: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_expense_with_flags() {
        let cli = Cli::try_parse_from([
            "tally", "expense", "Lunch", "25,90", "--category", "food", "--date", "2024-01-05",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Expense(args)) => {
                assert_eq!(args.description, "Lunch");
                assert_eq!(args.amount, "25,90");
                assert_eq!(args.category.as_deref(), Some("food"));
                assert_eq!(args.date.as_deref(), Some("2024-01-05"));
            }
            _ => panic!("expected expense command"),
        }
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let cli = Cli::try_parse_from(["tally", "income", "Refund", "-10"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Income(ref a)) if a.amount == "-10"));
    }

    #[test]
    fn test_overview_period_parses() {
        let cli = Cli::try_parse_from(["tally", "overview", "--period", "week"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Overview { period: Period::Week, .. })
        ));
        assert!(Cli::try_parse_from(["tally", "overview", "--period", "year"]).is_err());
    }

    #[test]
    fn test_report_months_is_bounded() {
        let cli = Cli::try_parse_from(["tally", "report", "monthly", "--months", "120"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Report {
                command: ReportCommands::Monthly { months: 120 }
            })
        ));
        for bad in ["0", "121", "100000000"] {
            assert!(
                Cli::try_parse_from(["tally", "report", "monthly", "--months", bad]).is_err(),
                "months: {bad}"
            );
        }
    }

    #[test]
    fn test_parse_month_opt() {
        assert_eq!(
            parse_month_opt(Some("2024-02")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(parse_month_opt(None).unwrap(), None);
        assert!(parse_month_opt(Some("2024-13")).is_err());
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert!(parse_day("2024-01-05").is_ok());
        assert!(parse_day("05/01/2024").is_err());
    }
}
