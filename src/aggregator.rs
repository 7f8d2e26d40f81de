//! Pure aggregation over transaction snapshots. Nothing here touches storage
//! or the clock; "today" is always passed in.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;

use crate::models::{Category, Transaction, TransactionType};

// ---------------------------------------------------------------------------
// Date windows
// ---------------------------------------------------------------------------

pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of the day, 23:59:59.999.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    day_start(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// First day of the week containing `date`.
pub fn week_start(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_sunday() - first_day.num_days_from_sunday()) % 7;
    date - Duration::days(offset as i64)
}

/// First and last calendar day of `date`'s month.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date - Duration::days(date.day0() as i64);
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let last = NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Inclusive date-time range of the period containing `date`.
    pub fn window(&self, date: NaiveDate, first_day: Weekday) -> (NaiveDateTime, NaiveDateTime) {
        match self {
            Period::Day => (day_start(date), day_end(date)),
            Period::Week => {
                let start = week_start(date, first_day);
                (day_start(start), day_end(start + Duration::days(6)))
            }
            Period::Month => {
                let (first, last) = month_bounds(date);
                (day_start(first), day_end(last))
            }
        }
    }

    pub fn summary(&self, ts: &[Transaction], date: NaiveDate, first_day: Weekday) -> Vec<Transaction> {
        match self {
            Period::Day => daily_summary(ts, date),
            Period::Week => weekly_summary(ts, date, first_day),
            Period::Month => monthly_summary(ts, date),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Period::Day),
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            other => Err(format!("unknown period '{other}' (expected day, week or month)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Transactions dated within `[start, end]`, in their original order.
pub fn filter_by_range(ts: &[Transaction], start: NaiveDateTime, end: NaiveDateTime) -> Vec<Transaction> {
    ts.iter()
        .filter(|t| t.date >= start && t.date <= end)
        .cloned()
        .collect()
}

pub fn daily_summary(ts: &[Transaction], date: NaiveDate) -> Vec<Transaction> {
    filter_by_range(ts, day_start(date), day_end(date))
}

pub fn weekly_summary(ts: &[Transaction], date: NaiveDate, first_day: Weekday) -> Vec<Transaction> {
    let (start, end) = Period::Week.window(date, first_day);
    filter_by_range(ts, start, end)
}

pub fn monthly_summary(ts: &[Transaction], date: NaiveDate) -> Vec<Transaction> {
    let (first, last) = month_bounds(date);
    filter_by_range(ts, day_start(first), day_end(last))
}

/// Sorted by `date`, most recent first. Ties keep insertion order.
pub fn newest_first(ts: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = ts.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Income minus expense.
pub fn balance(ts: &[Transaction]) -> Decimal {
    ts.iter()
        .map(Transaction::signed_amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum that clamps at `Decimal::MAX`/`MIN` instead of overflowing.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub count: usize,
}

pub fn totals(ts: &[Transaction]) -> Totals {
    let mut out = Totals::default();
    for t in ts {
        match t.kind {
            TransactionType::Income => out.income = out.income.saturating_add(t.amount),
            TransactionType::Expense => out.expense = out.expense.saturating_add(t.amount),
        }
    }
    out.balance = out.income.saturating_sub(out.expense);
    out.count = ts.len();
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

/// Per-category sums for one transaction type, in order of first appearance.
pub fn category_totals(ts: &[Transaction], kind: TransactionType) -> Vec<CategoryTotal> {
    let mut out: Vec<CategoryTotal> = Vec::new();
    for t in ts.iter().filter(|t| t.kind == kind) {
        match out.iter_mut().find(|c| c.category == t.category) {
            Some(entry) => {
                entry.total = entry.total.saturating_add(t.amount);
                entry.count += 1;
            }
            None => out.push(CategoryTotal {
                category: t.category,
                total: t.amount,
                count: 1,
            }),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Income and expense for each of the `month_count` months ending with
/// `today`'s month, oldest first.
pub fn monthly_series(ts: &[Transaction], month_count: usize, today: NaiveDate) -> Vec<MonthlyPoint> {
    let current = today.year() as i64 * 12 + today.month0() as i64;
    (0..month_count as i64)
        .rev()
        .filter_map(|back| {
            let index = current - back;
            let year = index.div_euclid(12) as i32;
            let month = index.rem_euclid(12) as u32 + 1;
            NaiveDate::from_ymd_opt(year, month, 1).map(|first| {
                let t = totals(&monthly_summary(ts, first));
                MonthlyPoint {
                    year,
                    month,
                    income: t.income,
                    expense: t.expense,
                    net: t.balance,
                }
            })
        })
        .collect()
}
