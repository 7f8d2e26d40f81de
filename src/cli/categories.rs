use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::models::{Category, TransactionType};
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let locale = load_settings().locale();

    let mut table = Table::new();
    table.set_header(vec!["Type", "Key", "Label"]);
    for kind in [TransactionType::Income, TransactionType::Expense] {
        let kind_cell = match kind {
            TransactionType::Income => "income".green().to_string(),
            TransactionType::Expense => "expense".red().to_string(),
        };
        for c in Category::all_for(kind) {
            table.add_row(vec![
                Cell::new(&kind_cell),
                Cell::new(c.key()),
                Cell::new(locale.category(*c)),
            ]);
        }
    }
    println!("Categories\n{table}");
    Ok(())
}
