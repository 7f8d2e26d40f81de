use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregator::{week_start, Period};
use crate::models::Category;

const MONTHS_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Number, date and label formatting for a locale tag such as `pt-BR` and an
/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq)]
pub struct Locale {
    tag: String,
    currency: String,
}

impl Locale {
    pub fn new(tag: &str, currency: &str) -> Self {
        Self {
            tag: tag.to_string(),
            currency: currency.to_uppercase(),
        }
    }

    fn language(&self) -> String {
        self.tag
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_lowercase()
    }

    fn is_portuguese(&self) -> bool {
        self.language() == "pt"
    }

    /// Comma as decimal separator, dot for thousands.
    fn comma_decimal(&self) -> bool {
        matches!(self.language().as_str(), "pt" | "es" | "de" | "fr" | "it" | "nl")
    }

    fn month_first(&self) -> bool {
        self.tag.eq_ignore_ascii_case("en-US")
    }

    fn symbol(&self) -> String {
        match self.currency.as_str() {
            "BRL" => "R$ ".to_string(),
            "USD" => "$".to_string(),
            "EUR" => "€".to_string(),
            "GBP" => "£".to_string(),
            other => format!("{other} "),
        }
    }

    /// Currency amount, e.g. `R$ 1.234,56` or `$1,234.56`.
    pub fn money(&self, val: Decimal) -> String {
        let negative = val < Decimal::ZERO;
        let cents = val
            .abs()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fixed = format!("{cents:.2}");
        let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let (group, point) = if self.comma_decimal() { ('.', ',') } else { (',', '.') };
        let mut grouped = String::new();
        for (i, c) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push(group);
            }
            grouped.push(c);
        }
        let grouped: String = grouped.chars().rev().collect();

        let sign = if negative { "-" } else { "" };
        format!("{sign}{}{grouped}{point}{dec_part}", self.symbol())
    }

    pub fn date(&self, d: NaiveDate) -> String {
        if self.month_first() {
            d.format("%m/%d/%Y").to_string()
        } else {
            d.format("%d/%m/%Y").to_string()
        }
    }

    fn month_name(&self, month: u32) -> &'static str {
        let i = (month.clamp(1, 12) - 1) as usize;
        if self.is_portuguese() {
            MONTHS_PT[i]
        } else {
            MONTHS_EN[i]
        }
    }

    /// Short month label for series rows: `jan`, `fev`, ... or `Jan`, `Feb`, ...
    pub fn month_abbrev(&self, month: u32) -> String {
        self.month_name(month).chars().take(3).collect()
    }

    /// Heading for a period view, e.g. `05 de janeiro de 2024`,
    /// `07/01 - 13/01/2024` or `janeiro de 2024`.
    pub fn period_label(&self, period: Period, date: NaiveDate, first_day: Weekday) -> String {
        match period {
            Period::Day if self.is_portuguese() => format!(
                "{:02} de {} de {}",
                date.day(),
                self.month_name(date.month()),
                date.year()
            ),
            Period::Day => format!(
                "{} {}, {}",
                self.month_name(date.month()),
                date.day(),
                date.year()
            ),
            Period::Week => {
                let start = week_start(date, first_day);
                let end = start + Duration::days(6);
                let short = if self.month_first() { "%m/%d" } else { "%d/%m" };
                format!("{} - {}", start.format(short), self.date(end))
            }
            Period::Month if self.is_portuguese() => {
                format!("{} de {}", self.month_name(date.month()), date.year())
            }
            Period::Month => format!("{} {}", self.month_name(date.month()), date.year()),
        }
    }

    pub fn category(&self, c: Category) -> &'static str {
        if self.is_portuguese() {
            c.label_pt()
        } else {
            c.label_en()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_money_formatting_brl() {
        let pt = Locale::new("pt-BR", "BRL");
        assert_eq!(pt.money(Decimal::new(123456, 2)), "R$ 1.234,56");
        assert_eq!(pt.money(Decimal::new(-500, 0)), "-R$ 500,00");
        assert_eq!(pt.money(Decimal::ZERO), "R$ 0,00");
        assert_eq!(pt.money(Decimal::new(100000099, 2)), "R$ 1.000.000,99");
    }

    #[test]
    fn test_money_formatting_usd() {
        let en = Locale::new("en-US", "usd");
        assert_eq!(en.money(Decimal::new(123456, 2)), "$1,234.56");
        assert_eq!(en.money(Decimal::new(421, 1)), "$42.10");
        assert_eq!(en.money(Decimal::new(-5, 3)), "-$0.01");
    }

    #[test]
    fn test_money_unknown_currency_uses_code() {
        let l = Locale::new("en-GB", "CHF");
        assert_eq!(l.money(Decimal::from(3)), "CHF 3.00");
    }

    #[test]
    fn test_dates_and_months() {
        let pt = Locale::new("pt-BR", "BRL");
        let en = Locale::new("en-US", "USD");
        assert_eq!(pt.date(d("2024-01-05")), "05/01/2024");
        assert_eq!(en.date(d("2024-01-05")), "01/05/2024");
        assert_eq!(pt.month_abbrev(2), "fev");
        assert_eq!(en.month_abbrev(2), "Feb");
    }

    #[test]
    fn test_period_labels() {
        let pt = Locale::new("pt-BR", "BRL");
        let date = d("2024-01-10");
        assert_eq!(pt.period_label(Period::Day, date, Weekday::Sun), "10 de janeiro de 2024");
        assert_eq!(pt.period_label(Period::Week, date, Weekday::Sun), "07/01 - 13/01/2024");
        assert_eq!(pt.period_label(Period::Month, date, Weekday::Sun), "janeiro de 2024");

        let en = Locale::new("en-US", "USD");
        assert_eq!(en.period_label(Period::Month, date, Weekday::Sun), "January 2024");
    }

    #[test]
    fn test_category_labels_follow_locale() {
        assert_eq!(Locale::new("pt-BR", "BRL").category(Category::Food), "Alimentação");
        assert_eq!(Locale::new("en-US", "USD").category(Category::Food), "Food");
    }
}
