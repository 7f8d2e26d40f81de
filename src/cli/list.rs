use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::aggregator::{day_end, day_start, filter_by_range, newest_first, totals};
use crate::cli::{open_store, parse_day};
use crate::error::{Result, TallyError};
use crate::fmt::Locale;
use crate::models::{Transaction, TransactionType};
use crate::settings::load_settings;

pub fn run(from_date: Option<&str>, to_date: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();
    let store = open_store(&settings)?;

    let selected = match (from_date, to_date) {
        (Some(from), Some(to)) => {
            filter_by_range(store.all(), day_start(parse_day(from)?), day_end(parse_day(to)?))
        }
        (Some(_), None) => {
            return Err(TallyError::Other(
                "--from requires --to (both date boundaries must be specified)".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(TallyError::Other(
                "--to requires --from (both date boundaries must be specified)".to_string(),
            ));
        }
        (None, None) => store.all().to_vec(),
    };

    if selected.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let rows = newest_first(&selected);
    println!("{}", register_table(&rows, &locale));

    let t = totals(&rows);
    println!(
        "{} transactions · income {} · expense {} · balance {}",
        t.count,
        locale.money(t.income).green(),
        locale.money(t.expense).red(),
        locale.money(t.balance).bold()
    );
    Ok(())
}

pub(crate) fn register_table(rows: &[Transaction], locale: &Locale) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount", "Notes"]);
    for t in rows {
        let amount = match t.kind {
            TransactionType::Income => locale.money(t.amount).green().to_string(),
            TransactionType::Expense => locale.money(-t.amount).red().to_string(),
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(locale.date(t.date.date())),
            Cell::new(&t.description),
            Cell::new(locale.category(t.category)),
            Cell::new(amount),
            Cell::new(t.notes.as_deref().unwrap_or("")),
        ]);
    }
    table
}
