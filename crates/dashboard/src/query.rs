//! Page query parameters: period selector, search, filters and page number.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    #[default]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "12m")]
    Last12Months,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last7Days => "7d",
            Period::Last30Days => "30d",
            Period::Last90Days => "90d",
            Period::Last12Months => "12m",
            Period::YearToDate => "ytd",
            Period::All => "all",
        }
    }

    /// Number of monthly points in the MRR trend for this period.
    pub fn trend_months(&self, today: NaiveDate) -> u32 {
        match self {
            Period::Last7Days | Period::Last30Days | Period::Last90Days => 6,
            Period::Last12Months => 12,
            Period::YearToDate => today.month(),
            Period::All => 36,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "90d" => Ok(Period::Last90Days),
            "12m" => Ok(Period::Last12Months),
            "ytd" => Ok(Period::YearToDate),
            "all" => Ok(Period::All),
            other => Err(format!("unknown period '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub period: Period,
    pub search: Option<String>,
    /// Plan (billing type) filter; `all` or absent disables it.
    pub plan: Option<String>,
    /// Overdue bucket filter (`1-7`, `8-15`, ...); `all` or absent disables it.
    pub days: Option<String>,
    pub page: u32,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!("12m".parse::<Period>().unwrap(), Period::Last12Months);
        assert_eq!("YTD".parse::<Period>().unwrap(), Period::YearToDate);
        assert!("1y".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::Last30Days);
    }

    #[test]
    fn test_trend_months() {
        let march = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(Period::YearToDate.trend_months(march), 3);
        assert_eq!(Period::Last12Months.trend_months(march), 12);
        assert_eq!(Period::Last7Days.trend_months(march), 6);
    }

    #[test]
    fn test_query_deserialize_defaults() {
        let q: PageQuery = serde_json::from_str(r#"{"period":"90d","search":"ana"}"#).unwrap();
        assert_eq!(q.period, Period::Last90Days);
        assert_eq!(q.search.as_deref(), Some("ana"));
        assert_eq!(q.page(), 1);
    }
}
