use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Calendar month a registration refers to. Displays as `MM/YYYY` and orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Competence {
    year: i32,
    month: u32,
}

const MONTH_ABBREVIATIONS: [(&str, u32); 12] = [
    ("jan", 1),
    ("fev", 2),
    ("mar", 3),
    ("abr", 4),
    ("mai", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("set", 9),
    ("out", 10),
    ("nov", 11),
    ("dez", 12),
];

impl Competence {
    pub fn new(year: i32, month: u32) -> Result<Self, CompetenceError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self { year, month })
            .ok_or(CompetenceError::OutOfRange { year, month })
    }

    /// Accepts the registry's `YYYYMM` export form, the `MM/YYYY` display form, and the
    /// abbreviated `mmm/YY` form used by the public history page.
    pub fn parse(raw: &str) -> Result<Self, CompetenceError> {
        let trimmed = raw.trim();
        let malformed = || CompetenceError::Malformed(trimmed.to_string());

        if trimmed.len() == 6 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            let year = trimmed[..4].parse().map_err(|_| malformed())?;
            let month = trimmed[4..].parse().map_err(|_| malformed())?;
            return Self::new(year, month);
        }

        let (month_part, year_part) = trimmed.split_once('/').ok_or_else(malformed)?;
        if !year_part.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(malformed());
        }

        let month = if month_part.bytes().all(|byte| byte.is_ascii_digit()) {
            month_part.parse().map_err(|_| malformed())?
        } else {
            let lowered = month_part.to_lowercase();
            MONTH_ABBREVIATIONS
                .iter()
                .find(|(abbreviation, _)| *abbreviation == lowered)
                .map(|(_, month)| *month)
                .ok_or_else(malformed)?
        };

        let year = match year_part.len() {
            2 => 2000 + year_part.parse::<i32>().map_err(|_| malformed())?,
            4 => year_part.parse().map_err(|_| malformed())?,
            _ => return Err(malformed()),
        };

        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Competence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for Competence {
    type Err = CompetenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for Competence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Competence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompetenceError {
    #[error("malformed competence '{0}'")]
    Malformed(String),
    #[error("competence month {month} is not valid for year {year}")]
    OutOfRange { year: i32, month: u32 },
}

/// One monthly registration of a professional at a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerEntry {
    /// Facility code, zero-padded to seven digits.
    pub facility_id: String,
    pub municipality_code: String,
    pub facility_name: String,
    pub weekly_hours: f64,
    pub occupation: String,
    pub competence: Competence,
}

impl CareerEntry {
    /// Key used by the establishment registry snapshot: municipality code followed by the
    /// padded facility code.
    pub fn composite_id(&self) -> String {
        format!("{}{}", self.municipality_code, self.facility_id)
    }

    pub(crate) fn has_valid_hours(&self) -> bool {
        self.weekly_hours.is_finite() && self.weekly_hours >= 0.0
    }
}
