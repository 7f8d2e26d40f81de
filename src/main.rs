mod aggregator;
mod cli;
mod db;
mod error;
mod fmt;
mod models;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use aggregator::Period;
use cli::{Cli, Commands, ReportCommands};
use models::TransactionType;

fn main() {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::overview::run(Period::Day, None),
        Some(command) => match command {
            Commands::Init {
                data_dir,
                locale,
                currency,
                week_start,
            } => cli::init::run(data_dir, locale, currency, week_start),
            Commands::Income(args) => cli::add::run(TransactionType::Income, args),
            Commands::Expense(args) => cli::add::run(TransactionType::Expense, args),
            Commands::Delete { id } => cli::delete::run(id),
            Commands::List { from_date, to_date } => {
                cli::list::run(from_date.as_deref(), to_date.as_deref())
            }
            Commands::Overview { period, date } => cli::overview::run(period, date.as_deref()),
            Commands::Report { command } => match command {
                ReportCommands::Monthly { months } => cli::report::monthly(usize::from(months)),
                ReportCommands::Categories { kind, month } => {
                    cli::report::categories(kind, month.as_deref())
                }
            },
            Commands::Categories => cli::categories::run(),
            Commands::Export { output } => cli::export::run(output),
            Commands::Backup { output } => cli::backup::run(output),
            Commands::Status => cli::status::run(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn` level.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}
