//! pt-BR display formatting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `R$ 1.234,56`. Negative amounts render as `-R$ 1.234,56`.
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0,00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {},{:02}", group_thousands(cents / 100), cents % 100)
}

/// `33,3%`
pub fn percent(value: f64) -> String {
    if !value.is_finite() {
        return "0,0%".to_string();
    }
    format!("{value:.1}%").replace('.', ",")
}

/// `dd/mm/yyyy`
pub fn date(value: NaiveDate) -> String {
    value.format("%d/%m/%Y").to_string()
}

pub fn optional_date(value: Option<NaiveDate>) -> String {
    value.map(date).unwrap_or_else(|| "-".to_string())
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(".")
}

/// Badge colour of a status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Green,
    Yellow,
    Red,
    Gray,
}
