use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Month, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Calendar month that partitions every member counter.
///
/// The canonical form is the fixed-width string `MM-YYYY`. Field order is
/// month then year so the derived ordering matches the canonical string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthPeriod {
    month: u8,
    year: u16,
}

impl MonthPeriod {
    pub fn new(month: u32, year: i32) -> Result<Self, DomainError> {
        let valid_month = u8::try_from(month).ok().filter(|month| (1..=12).contains(month));
        let valid_year = u16::try_from(year).ok().filter(|year| *year <= 9999);

        match (valid_month, valid_year) {
            (Some(month), Some(year)) => Ok(Self { month, year }),
            _ => Err(DomainError::InvalidPeriod(format!("{month}-{year}"))),
        }
    }

    /// Month containing `at`, in UTC.
    pub fn containing(at: DateTime<Utc>) -> Self {
        let year = at.year().clamp(0, 9999);
        Self { month: at.month() as u8, year: year as u16 }
    }

    pub fn month(&self) -> u32 {
        u32::from(self.month)
    }

    pub fn year(&self) -> i32 {
        i32::from(self.year)
    }

    /// Human label such as `October 2023`.
    pub fn label(&self) -> String {
        let name = Month::try_from(self.month).map(|month| month.name()).unwrap_or("Unknown");
        format!("{name} {:04}", self.year)
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl FromStr for MonthPeriod {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || DomainError::InvalidPeriod(trimmed.to_owned());

        let (month, year) = trimmed.split_once('-').ok_or_else(invalid)?;
        let month_ok = matches!(month.len(), 1 | 2) && month.bytes().all(|b| b.is_ascii_digit());
        let year_ok = year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
        if !month_ok || !year_ok {
            return Err(invalid());
        }

        let month = month.parse::<u32>().map_err(|_| invalid())?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        Self::new(month, year).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthPeriod {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthPeriod> for String {
    fn from(value: MonthPeriod) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::MonthPeriod;
    use crate::errors::DomainError;

    #[test]
    fn parses_canonical_and_short_month_forms() {
        let october: MonthPeriod = "10-2023".parse().expect("canonical");
        assert_eq!(october.month(), 10);
        assert_eq!(october.year(), 2023);
        assert_eq!(october.to_string(), "10-2023");

        let march: MonthPeriod = " 3-2024 ".parse().expect("short month");
        assert_eq!(march.to_string(), "03-2024");
    }

    #[test]
    fn rejects_values_that_are_not_calendar_months() {
        for raw in ["", "2023-10", "13-2023", "00-2023", "10-23", "10/2023", "ab-2023", "10-2023-1"] {
            let error = raw.parse::<MonthPeriod>().expect_err(raw);
            assert!(matches!(error, DomainError::InvalidPeriod(_)), "{raw}");
        }
    }

    #[test]
    fn containing_uses_the_utc_calendar_month() {
        let at = Utc.with_ymd_and_hms(2023, 10, 31, 23, 59, 59).single().expect("timestamp");
        assert_eq!(MonthPeriod::containing(at).to_string(), "10-2023");

        let next = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).single().expect("timestamp");
        assert_eq!(MonthPeriod::containing(next).to_string(), "11-2023");
    }

    #[test]
    fn ordering_matches_canonical_string_ordering() {
        let mut periods: Vec<MonthPeriod> = ["11-2022", "10-2023", "01-2024", "10-2022"]
            .iter()
            .map(|raw| raw.parse().expect("period"))
            .collect();
        periods.sort();

        let mut canonical: Vec<String> = periods.iter().map(ToString::to_string).collect();
        let rendered = canonical.clone();
        canonical.sort();
        assert_eq!(rendered, canonical);
    }

    #[test]
    fn label_names_the_month() {
        let period: MonthPeriod = "10-2023".parse().expect("period");
        assert_eq!(period.label(), "October 2023");
    }

    #[test]
    fn serde_uses_the_canonical_string() {
        let period: MonthPeriod = "7-2021".parse().expect("period");
        let json = serde_json::to_string(&period).expect("serialize");
        assert_eq!(json, "\"07-2021\"");

        let parsed: MonthPeriod = serde_json::from_str("\"07-2021\"").expect("deserialize");
        assert_eq!(parsed, period);
        assert!(serde_json::from_str::<MonthPeriod>("\"2021-07\"").is_err());
    }
}
