use crate::cli::open_store;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(id: i64) -> Result<()> {
    let settings = load_settings();
    let locale = settings.locale();
    let mut store = open_store(&settings)?;

    let summary = store
        .get(id)
        .map(|t| format!("{} ({})", t.description, locale.money(t.amount)));

    if store.remove(id)? {
        println!("Deleted #{id}: {}", summary.unwrap_or_default());
    } else {
        println!("No transaction with ID {id}. Nothing changed.");
    }
    Ok(())
}
