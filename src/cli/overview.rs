use colored::Colorize;
use rust_decimal::Decimal;

use crate::aggregator::{balance, totals, Period};
use crate::cli::list::register_table;
use crate::cli::{day_or_today, open_store};
use crate::error::Result;
use crate::settings::load_settings;

/// How many of the period's transactions to show under the totals.
const RECENT_LIMIT: usize = 5;

pub fn run(period: Period, date: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();
    let first_day = settings.first_day();
    let date = day_or_today(date)?;
    let store = open_store(&settings)?;

    let overall = balance(store.all());
    let overall_str = locale.money(overall);
    let overall_str = if overall >= Decimal::ZERO {
        overall_str.green().bold()
    } else {
        overall_str.red().bold()
    };
    println!("Overall balance: {overall_str}");
    println!();

    let in_period = period.summary(store.all(), date, first_day);
    let t = totals(&in_period);

    println!("{}", locale.period_label(period, date, first_day).bold());
    let period_balance = if t.balance >= Decimal::ZERO {
        locale.money(t.balance).green()
    } else {
        locale.money(t.balance).red()
    };
    println!("  Balance:  {period_balance}");
    println!("  Income:   {}", locale.money(t.income).green());
    println!("  Expenses: {}", locale.money(t.expense).red());
    println!();

    if in_period.is_empty() {
        println!("No transactions found.");
    } else {
        let recent: Vec<_> = in_period.iter().take(RECENT_LIMIT).cloned().collect();
        println!("Recent transactions\n{}", register_table(&recent, &locale));
        if in_period.len() > RECENT_LIMIT {
            println!("... and {} more (see `tally list`)", in_period.len() - RECENT_LIMIT);
        }
    }
    Ok(())
}
