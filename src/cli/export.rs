use std::io::Write;
use std::path::PathBuf;

use crate::cli::open_store;
use crate::error::Result;
use crate::models::Transaction;
use crate::settings::load_settings;

const HEADER: [&str; 8] = [
    "id",
    "type",
    "date",
    "description",
    "category",
    "amount",
    "notes",
    "created_at",
];

pub fn run(output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;

    let dest = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let exports_dir = PathBuf::from(&settings.data_dir).join("exports");
            std::fs::create_dir_all(&exports_dir)?;
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            exports_dir.join(format!("tally-{stamp}.csv"))
        }
    };

    let file = std::fs::File::create(&dest)?;
    write_csv(store.all(), file)?;
    println!("Exported {} transactions to {}", store.len(), dest.display());
    Ok(())
}

/// One row per transaction in insertion order, amounts unsigned.
pub fn write_csv<W: Write>(transactions: &[Transaction], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for t in transactions {
        wtr.write_record([
            t.id.to_string(),
            t.kind.to_string(),
            t.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            t.description.clone(),
            t.category.key().to_string(),
            t.amount.to_string(),
            t.notes.clone().unwrap_or_default(),
            t.created_at.to_rfc3339(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{parse_input_date, Category, TransactionType};

    #[test]
    fn test_write_csv_rows() {
        let t = Transaction {
            id: 7,
            kind: TransactionType::Expense,
            description: "Bus, downtown".to_string(),
            amount: Decimal::new(450, 2),
            category: Category::Transport,
            date: parse_input_date("2024-01-05 08:15").unwrap(),
            notes: None,
            created_at: Utc::now(),
        };
        let mut buf = Vec::new();
        write_csv(&[t], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,type,date,description,category,amount,notes,created_at")
        );
        let row = lines.next().unwrap();
        assert!(
            row.starts_with("7,expense,2024-01-05 08:15:00,\"Bus, downtown\",transport,4.50,,"),
            "got: {row}"
        );
        assert_eq!(lines.next(), None);
    }
}
