// src/models/mod.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Only tickets in this terminal status are scored against their SLA.
pub const ELIGIBLE_STATUS: &str = "Permanently Closed";

// ───────────────────────────────────────
// Severity
// ───────────────────────────────────────

/// Ticket severity, level 1 (most urgent) through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Severity {
    S1 = 1,
    S2 = 2,
    S3 = 3,
    S4 = 4,
    S5 = 5,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::S1,
        Severity::S2,
        Severity::S3,
        Severity::S4,
        Severity::S5,
    ];

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Severity::S1),
            2 => Some(Severity::S2),
            3 => Some(Severity::S3),
            4 => Some(Severity::S4),
            5 => Some(Severity::S5),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Accepts the export's `"Severity N"` shape as well as a bare `"N"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        let rest = match t.get(..8) {
            Some(prefix) if prefix.eq_ignore_ascii_case("severity") => t[8..].trim_start(),
            _ => t,
        };
        rest.parse::<u8>().ok().and_then(Self::from_level)
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.level()
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Severity::from_level(level).ok_or_else(|| format!("severity out of range 1-5: {level}"))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Severity {}", self.level())
    }
}

// ───────────────────────────────────────
// Raw tables (replaced wholesale per upload)
// ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub issue_key: String,
    pub severity: Severity,
    pub status: String,
    pub created: DateTime<Utc>,
    pub resolved: Option<DateTime<Utc>>,
    pub fr_target: Option<DateTime<Utc>>,
    pub fr_actual: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
    pub product: Option<String>,
    pub environment: Option<String>,
    pub summary: Option<String>,
    /// Canonical display form (trimmed, inner whitespace collapsed).
    pub company: String,
    pub reopen_count: u32,
}

impl Ticket {
    pub fn is_eligible(&self) -> bool {
        self.status == ELIGIBLE_STATUS
    }
}

/// One row of the SLA matrix: minute budgets for a company × severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaThreshold {
    pub company: String,
    pub severity: Severity,
    pub first_response_minutes: u32,
    pub resolution_minutes: u32,
}
