use std::path::PathBuf;

use crate::db::{backup_to, get_connection};
use crate::error::{Result, TallyError};
use crate::settings::load_settings;

pub fn run(output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(TallyError::Other(format!(
            "No database found at {}. Run `tally init` first.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;

    let dest_path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let backups_dir = PathBuf::from(&settings.data_dir).join("backups");
            std::fs::create_dir_all(&backups_dir)?;
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            backups_dir.join(format!("tally-{stamp}.db"))
        }
    };

    backup_to(&conn, &dest_path)?;

    let size = std::fs::metadata(&dest_path)?.len();
    println!("Backup saved to {}", dest_path.display());
    println!("Size: {size} bytes");
    Ok(())
}
