use crate::cli::open_store;
use crate::error::{Result, TallyError};
use crate::settings::{load_settings, parse_weekday, save_settings, shellexpand_path};

pub fn run(
    data_dir: Option<String>,
    locale: Option<String>,
    currency: Option<String>,
    week_start: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(tag) = locale {
        settings.locale = tag.trim().to_string();
    }
    if let Some(code) = currency {
        let code = code.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TallyError::Settings(format!(
                "currency must be a three-letter code like BRL or USD, got '{code}'"
            )));
        }
        settings.currency = code;
    }
    if let Some(day) = week_start {
        settings.week_start = parse_weekday(&day)?.to_string();
    }

    save_settings(&settings)?;
    let store = open_store(&settings)?;

    println!("Initialized tally at {}", settings.data_dir);
    println!(
        "Locale {} · currency {} · weeks start on {}",
        settings.locale, settings.currency, settings.week_start
    );
    if !store.is_empty() {
        println!("Found {} existing transactions.", store.len());
    }
    Ok(())
}
