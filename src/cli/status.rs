use crate::cli::open_store;
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists};
use crate::store::{LoadStatus, RECOVERY_KEY};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    if !settings_file_exists() {
        println!("Settings:   defaults (run `tally init` to save them)");
    }
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Locale:     {} ({})", settings.locale, settings.currency);
    println!("Week start: {}", settings.week_start);

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `tally init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {size} bytes");

    let store = open_store(&settings)?;
    println!();
    println!("Transactions: {}", store.len());
    if let LoadStatus::Recovered { reason } = store.status() {
        println!("Warning: saved transactions were unreadable ({reason}).");
        println!("The raw data was kept in the database under '{RECOVERY_KEY}'.");
    }
    Ok(())
}
