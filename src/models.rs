use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type '{other}' (expected income or expense)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    // Income
    Salary,
    Freelance,
    Sales,
    Investments,
    Gifts,
    OtherIncome,
    // Expense
    Food,
    Transport,
    Housing,
    Health,
    Education,
    Leisure,
    Clothing,
    OtherExpense,
}

pub const INCOME_CATEGORIES: &[Category] = &[
    Category::Salary,
    Category::Freelance,
    Category::Sales,
    Category::Investments,
    Category::Gifts,
    Category::OtherIncome,
];

pub const EXPENSE_CATEGORIES: &[Category] = &[
    Category::Food,
    Category::Transport,
    Category::Housing,
    Category::Health,
    Category::Education,
    Category::Leisure,
    Category::Clothing,
    Category::OtherExpense,
];

impl Category {
    pub fn kind(&self) -> TransactionType {
        if INCOME_CATEGORIES.contains(self) {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }

    pub fn all_for(kind: TransactionType) -> &'static [Category] {
        match kind {
            TransactionType::Income => INCOME_CATEGORIES,
            TransactionType::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// Stable key, identical to the serialized form.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Salary => "salary",
            Category::Freelance => "freelance",
            Category::Sales => "sales",
            Category::Investments => "investments",
            Category::Gifts => "gifts",
            Category::OtherIncome => "other_income",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Health => "health",
            Category::Education => "education",
            Category::Leisure => "leisure",
            Category::Clothing => "clothing",
            Category::OtherExpense => "other_expense",
        }
    }

    pub fn label_pt(&self) -> &'static str {
        match self {
            Category::Salary => "Salário",
            Category::Freelance => "Freelance",
            Category::Sales => "Vendas",
            Category::Investments => "Investimentos",
            Category::Gifts => "Presentes",
            Category::OtherIncome => "Outros",
            Category::Food => "Alimentação",
            Category::Transport => "Transporte",
            Category::Housing => "Moradia",
            Category::Health => "Saúde",
            Category::Education => "Educação",
            Category::Leisure => "Lazer",
            Category::Clothing => "Vestuário",
            Category::OtherExpense => "Outros",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            Category::Salary => "Salary",
            Category::Freelance => "Freelance",
            Category::Sales => "Sales",
            Category::Investments => "Investments",
            Category::Gifts => "Gifts",
            Category::OtherIncome => "Other",
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Leisure => "Leisure",
            Category::Clothing => "Clothing",
            Category::OtherExpense => "Other",
        }
    }

    /// Match user input against the keys and labels of one type's categories.
    /// Labels are shared across types ("Outros"), so the type disambiguates.
    pub fn parse_for(kind: TransactionType, input: &str) -> Option<Category> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Category::all_for(kind).iter().copied().find(|c| {
            c.key() == needle
                || c.label_pt().to_lowercase() == needle
                || c.label_en().to_lowercase() == needle
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub category: Category,
    #[serde(with = "stored_date")]
    pub date: NaiveDateTime,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign its type contributes to a balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

mod stored_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_stored_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date: {raw}")))
    }
}

/// Parse a persisted date. Timestamps carrying an offset, such as
/// `2024-01-05T15:00:00.000Z`, are converted to local wall-clock time.
/// Precision is cut to milliseconds, the finest unit the stored form keeps.
pub fn parse_stored_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        Some(dt.with_timezone(&Local).naive_local())
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Some(dt)
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    };
    parsed.map(|dt| dt.trunc_subsecs(3))
}

/// Parse a date typed on the command line: `YYYY-MM-DD`, optionally with a
/// `HH:MM` time, or any stored form.
pub fn parse_input_date(raw: &str) -> Option<NaiveDateTime> {
    parse_stored_date(raw)
        .or_else(|| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M").ok())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("  {}: {}", e.field, e.message))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

/// A transaction as entered, before the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub description: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Validate raw form input. Every failing field is reported, not just the
    /// first one.
    pub fn parse(
        kind: TransactionType,
        description: &str,
        amount: &str,
        category: &str,
        date: &str,
        notes: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let description = description.trim();
        if description.is_empty() {
            errors.push("description", "Description is required");
        }

        let amount = match parse_amount(amount) {
            Ok(a) => Some(a),
            Err(msg) => {
                errors.push("amount", msg);
                None
            }
        };

        let category = if category.trim().is_empty() {
            errors.push("category", "Category is required");
            None
        } else {
            let parsed = Category::parse_for(kind, category);
            if parsed.is_none() {
                errors.push(
                    "category",
                    format!("'{}' is not an {kind} category", category.trim()),
                );
            }
            parsed
        };

        let date = if date.trim().is_empty() {
            errors.push("date", "Date is required");
            None
        } else {
            let parsed = parse_input_date(date);
            if parsed.is_none() {
                errors.push("date", format!("'{}' is not a valid date (YYYY-MM-DD)", date.trim()));
            }
            parsed
        };

        match (amount, category, date) {
            (Some(amount), Some(category), Some(date)) if errors.is_empty() => Ok(NewTransaction {
                kind,
                description: description.to_string(),
                amount,
                category,
                date,
                notes: notes
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(errors),
        }
    }

    pub fn into_transaction(self, id: i64, created_at: DateTime<Utc>) -> Transaction {
        debug_assert_eq!(self.category.kind(), self.kind);
        Transaction {
            id,
            kind: self.kind,
            description: self.description,
            amount: self.amount,
            category: self.category,
            date: self.date,
            notes: self.notes,
            created_at,
        }
    }
}

/// Largest amount a single transaction may carry: 999,999,999,999.99.
/// Keeps every sum the aggregator folds far from `Decimal::MAX`.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Accepts `1234.56` and the comma-decimal `1234,56`, with at most two
/// decimal places.
fn parse_amount(raw: &str) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Amount is required");
    }
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    match Decimal::from_str(&normalized) {
        Ok(a) if a <= Decimal::ZERO => Err("Amount must be a positive number"),
        Ok(a) if a > max_amount() => Err("Amount is too large"),
        Ok(a) if a.normalize().scale() > 2 => Err("Amount can have at most 2 decimal places"),
        Ok(a) => Ok(a),
        Err(_) => Err("Amount must be a positive number"),
    }
}
