use std::path::PathBuf;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::db::DB_FILE;
use crate::error::{Result, TallyError};
use crate::fmt::Locale;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// First day of the week for weekly summaries, e.g. "Sun" or "Mon".
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

fn default_locale() -> String {
    "pt-BR".to_string()
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_week_start() -> String {
    "Sun".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            locale: default_locale(),
            currency: default_currency(),
            week_start: default_week_start(),
        }
    }
}

impl Settings {
    pub fn locale(&self) -> Locale {
        Locale::new(&self.locale, &self.currency)
    }

    /// Configured week start; an unrecognised value falls back to Sunday.
    pub fn first_day(&self) -> Weekday {
        parse_weekday(&self.week_start).unwrap_or(Weekday::Sun)
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

pub fn parse_weekday(raw: &str) -> Result<Weekday> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| TallyError::Settings(format!("unknown weekday: {raw}")))
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tally")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("tally")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TallyError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
