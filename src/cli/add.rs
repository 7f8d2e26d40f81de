use std::cell::Cell;
use std::rc::Rc;

use colored::Colorize;

use crate::aggregator::balance;
use crate::cli::{open_store, EntryArgs};
use crate::error::{Result, TallyError};
use crate::models::{NewTransaction, TransactionType};
use crate::settings::load_settings;

pub fn run(kind: TransactionType, args: EntryArgs) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();

    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string());
    let new = NewTransaction::parse(
        kind,
        &args.description,
        &args.amount,
        args.category.as_deref().unwrap_or(""),
        &date,
        args.notes.as_deref(),
    )
    .map_err(TallyError::Validation)?;

    let mut store = open_store(&settings)?;
    let changed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&changed);
    let subscription = store.subscribe(move |_| flag.set(true));

    let label = locale.category(new.category);
    let amount = locale.money(new.amount);
    let id = store.add(new)?;
    store.unsubscribe(subscription);

    let kind_label = match kind {
        TransactionType::Income => "income".green(),
        TransactionType::Expense => "expense".red(),
    };
    println!("Added {kind_label} #{id}: {amount} ({label})");

    if changed.get() {
        println!("Balance: {}", locale.money(balance(store.all())));
    }
    Ok(())
}
