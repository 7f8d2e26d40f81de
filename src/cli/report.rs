use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::aggregator::{category_totals, monthly_series, monthly_summary, sum_amounts};
use crate::cli::{open_store, parse_month_opt};
use crate::error::Result;
use crate::models::TransactionType;
use crate::settings::load_settings;

pub fn monthly(months: usize) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();
    let store = open_store(&settings)?;
    let today = chrono::Local::now().date_naive();

    let series = monthly_series(store.all(), months, today);

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
    for point in &series {
        let net = if point.net >= Decimal::ZERO {
            locale.money(point.net).green().to_string()
        } else {
            locale.money(point.net).red().to_string()
        };
        table.add_row(vec![
            Cell::new(format!("{} {}", locale.month_abbrev(point.month), point.year)),
            Cell::new(locale.money(point.income)),
            Cell::new(locale.money(point.expense)),
            Cell::new(net),
        ]);
    }

    let income = sum_amounts(series.iter().map(|p| p.income));
    let expense = sum_amounts(series.iter().map(|p| p.expense));
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(locale.money(income)),
        Cell::new(locale.money(expense)),
        Cell::new(locale.money(income.saturating_sub(expense))),
    ]);

    println!("Last {months} months\n{table}");
    Ok(())
}

pub fn categories(kind: TransactionType, month: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();
    let store = open_store(&settings)?;

    let (scope, items) = match parse_month_opt(month)? {
        Some(first) => (
            format!("{} {}", locale.month_abbrev(first.month()), first.year()),
            category_totals(&monthly_summary(store.all(), first), kind),
        ),
        None => ("all time".to_string(), category_totals(store.all(), kind)),
    };

    let title = match kind {
        TransactionType::Income => "Income by category".green().bold(),
        TransactionType::Expense => "Expenses by category".red().bold(),
    };

    if items.is_empty() {
        println!("{title} ({scope})\nNo {kind} transactions found.");
        return Ok(());
    }

    let total = sum_amounts(items.iter().map(|i| i.total));
    let mut sorted = items;
    sorted.sort_by(|a, b| b.total.cmp(&a.total));

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    for item in &sorted {
        let pct = if total.is_zero() {
            Decimal::ZERO
        } else {
            (item.total / total * Decimal::ONE_HUNDRED).round_dp(1)
        };
        table.add_row(vec![
            Cell::new(locale.category(item.category)),
            Cell::new(locale.money(item.total)),
            Cell::new(format!("{pct:.1}%")),
            Cell::new(item.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(locale.money(total)),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("{title} ({scope})\n{table}");
    Ok(())
}
