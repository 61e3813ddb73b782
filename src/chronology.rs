//! Chronological ordering of date labels
//!
//! Date labels come from file names and are either calendar dates
//! ("2024-01-15", "20240115") or numbered sequence labels ("Week10",
//! "essay_3", "7"). Sequence labels order by number, so Week2 comes before
//! Week10.

use chrono::NaiveDate;

const CALENDAR_FORMATS: &[&str] = &["%Y-%m-%d", "%Y_%m_%d", "%Y.%m.%d", "%Y%m%d"];

/// Parsed form of a date label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateKey {
    /// Calendar date; sorts before every sequence label
    Calendar(NaiveDate),
    /// Lowercased textual prefix plus trailing number
    Sequence { prefix: String, number: u64 },
}

/// Parse a date label, returning `None` when it is neither a calendar date
/// nor ends in a number
pub fn parse_date_label(label: &str) -> Option<DateKey> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    if let Some(date) = CALENDAR_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(label, format).ok())
    {
        return Some(DateKey::Calendar(date));
    }

    let digits_start = label
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;

    let number = label[digits_start..].parse::<u64>().ok()?;
    let prefix = label[..digits_start]
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    Some(DateKey::Sequence { prefix, number })
}

/// Sort key placing a record on a student timeline
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChronoKey {
    /// Parsed label; ties break by file name, then input position
    Dated(DateKey, String, usize),
    /// Unparseable label; sorts after dated records by file name, then input position
    Undated(String, usize),
}

impl ChronoKey {
    pub fn new(date_label: &str, file_name: &str, position: usize) -> Self {
        match parse_date_label(date_label) {
            Some(key) => ChronoKey::Dated(key, file_name.to_string(), position),
            None => ChronoKey::Undated(file_name.to_string(), position),
        }
    }

    pub fn is_dated(&self) -> bool {
        matches!(self, ChronoKey::Dated(..))
    }
}
