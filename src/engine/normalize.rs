// src/engine/normalize.rs

use chrono::{DateTime, NaiveDateTime, Utc};

/// JIRA-style export timestamp, e.g. "18/Aug/25 6:00 PM". Interpreted as UTC.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%y %I:%M %p";

/// Canonical display form of a company name: trimmed, internal whitespace
/// runs collapsed to a single space.
pub fn canonical_company(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join key for the ticket ↔ threshold merge. Must be applied identically
/// to both tables or the join silently drops rows.
pub fn company_join_key(raw: &str) -> String {
    canonical_company(raw).to_lowercase()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)?;
    Ok(naive.and_utc())
}
