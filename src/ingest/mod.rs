// src/ingest/mod.rs
//
// CSV boundary for the two uploads. Any IngestError rejects the whole
// batch — a partially-normalized ticket table would silently corrupt every
// downstream aggregate. Data-quality findings that do not block ingestion
// are collected as warnings and returned with the batch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::engine::normalize::{canonical_company, parse_timestamp};
use crate::models::{Severity, SlaThreshold, Ticket};

// Verbatim column headers from the ticket export.
pub const COL_ISSUE_KEY: &str = "Issue key";
pub const COL_SEVERITY: &str = "Custom field (Severity)";
pub const COL_STATUS: &str = "Status";
pub const COL_FR_TARGET: &str = "Custom field (First Response SLA Target Date)";
pub const COL_FR_ACTUAL: &str = "Custom field (First Response SLA Actual Date)";
pub const COL_CREATED: &str = "Created";
pub const COL_UPDATED: &str = "Updated";
pub const COL_RESOLVED: &str = "Resolved";
pub const COL_ASSIGNEE: &str = "Assignee";
pub const COL_ENVIRONMENT: &str = "Custom field (Environment)";
pub const COL_PRODUCT: &str = "Custom field (Product)";
pub const COL_SUMMARY: &str = "Summary";
pub const COL_COMPANY: &str = "Custom field (CRM Company)";
pub const COL_REOPEN: &str = "Custom field (Reopen Count)";

pub const COL_CRM_COMPANY: &str = "CRM Company";

pub const REQUIRED_TICKET_COLS: [&str; 11] = [
    COL_ISSUE_KEY,
    COL_SEVERITY,
    COL_STATUS,
    COL_FR_TARGET,
    COL_FR_ACTUAL,
    COL_CREATED,
    COL_RESOLVED,
    COL_ASSIGNEE,
    COL_PRODUCT,
    COL_COMPANY,
    COL_REOPEN,
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("data row {row}, column \"{column}\": {message}")]
    InvalidField {
        row: usize,
        column: &'static str,
        message: String,
    },
    #[error("{0}")]
    Shape(String),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
}

impl IngestError {
    pub fn row(&self) -> Option<usize> {
        match self {
            IngestError::InvalidField { row, .. } => Some(*row),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            IngestError::MissingColumn(column) => Some(column),
            IngestError::InvalidField { column, .. } => Some(column),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct TicketBatch {
    pub tickets: Vec<Ticket>,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct ThresholdBatch {
    pub thresholds: Vec<SlaThreshold>,
    pub warnings: Vec<String>,
}

// ───────────────────────────────────────
// Tickets CSV
// ───────────────────────────────────────

pub fn ingest_tickets(data: &[u8]) -> Result<TicketBatch, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    for col in REQUIRED_TICKET_COLS {
        if !columns.contains_key(col) {
            return Err(IngestError::MissingColumn(col));
        }
    }

    let mut warnings = Vec::new();
    let mut tickets: Vec<Ticket> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1; // 1-based data row, header not counted
        let field = |col: &str| field_of(&record, &columns, col);

        let issue_key = field(COL_ISSUE_KEY).to_string();
        if issue_key.is_empty() {
            return Err(IngestError::InvalidField {
                row,
                column: COL_ISSUE_KEY,
                message: "empty issue key".into(),
            });
        }

        let raw_severity = field(COL_SEVERITY);
        let severity = Severity::parse(raw_severity).ok_or_else(|| IngestError::InvalidField {
            row,
            column: COL_SEVERITY,
            message: format!("severity must be 1-5, got {raw_severity:?}"),
        })?;

        let created = required_timestamp(field(COL_CREATED), row, COL_CREATED)?;
        let resolved = optional_timestamp(field(COL_RESOLVED), row, COL_RESOLVED)?;
        let fr_target = optional_timestamp(field(COL_FR_TARGET), row, COL_FR_TARGET)?;
        let fr_actual = optional_timestamp(field(COL_FR_ACTUAL), row, COL_FR_ACTUAL)?;
        let updated = optional_timestamp(field(COL_UPDATED), row, COL_UPDATED)?;

        if let Some(resolved) = resolved {
            if resolved < created {
                warnings.push(format!(
                    "data row {row}: resolved precedes created for {issue_key}; elapsed minutes clamp to 0"
                ));
            }
        }

        let raw_reopen = field(COL_REOPEN);
        let reopen_count = if raw_reopen.is_empty() {
            0
        } else {
            match raw_reopen.parse::<i64>() {
                Ok(n) if n < 0 => {
                    warnings.push(format!(
                        "data row {row}: negative reopen count {n} clamped to 0"
                    ));
                    0
                }
                Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
                Err(_) => {
                    warnings.push(format!(
                        "data row {row}: unreadable reopen count {raw_reopen:?} treated as 0"
                    ));
                    0
                }
            }
        };

        let ticket = Ticket {
            issue_key,
            severity,
            status: field(COL_STATUS).to_string(),
            created,
            resolved,
            fr_target,
            fr_actual,
            updated,
            assignee: opt_string(field(COL_ASSIGNEE)),
            product: opt_string(field(COL_PRODUCT)),
            environment: opt_string(field(COL_ENVIRONMENT)),
            summary: opt_string(field(COL_SUMMARY)),
            company: canonical_company(field(COL_COMPANY)),
            reopen_count,
        };

        // Wholesale replacement per upload: within one batch the last
        // occurrence of an issue key wins.
        if let Some(&slot) = by_key.get(&ticket.issue_key) {
            warnings.push(format!(
                "duplicate issue key {}: keeping the last occurrence",
                ticket.issue_key
            ));
            tickets[slot] = ticket;
        } else {
            by_key.insert(ticket.issue_key.clone(), tickets.len());
            tickets.push(ticket);
        }
    }

    Ok(TicketBatch { tickets, warnings })
}

// ───────────────────────────────────────
// SLA matrix CSV (wide: one company row, per-severity minute columns)
// ───────────────────────────────────────

enum BudgetKind {
    FirstResponse,
    Resolution,
}

pub fn ingest_thresholds(data: &[u8]) -> Result<ThresholdBatch, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers()?.clone();

    let header_re = Regex::new(r"(?i)^Severity\s*([1-5])\s*(First\s*Response|Resolution)$")
        .map_err(|e| IngestError::Shape(e.to_string()))?;

    let mut company_col = None;
    let mut severity_cols: Vec<(usize, Severity, BudgetKind)> = Vec::new();
    for (i, name) in headers.iter().enumerate() {
        let name = name.trim();
        if name == COL_CRM_COMPANY {
            company_col = Some(i);
            continue;
        }
        if let Some(caps) = header_re.captures(name) {
            let Some(severity) = caps[1].parse::<u8>().ok().and_then(Severity::from_level) else {
                continue;
            };
            let kind = if caps[2].to_ascii_lowercase().starts_with("first") {
                BudgetKind::FirstResponse
            } else {
                BudgetKind::Resolution
            };
            severity_cols.push((i, severity, kind));
        }
    }

    let company_col = company_col.ok_or(IngestError::MissingColumn(COL_CRM_COMPANY))?;
    if severity_cols.is_empty() {
        return Err(IngestError::Shape(
            "expected columns like 'Severity 1 First Response' and 'Severity 1 Resolution' (minutes)"
                .into(),
        ));
    }

    let mut warnings = Vec::new();
    let mut cells: HashMap<(String, Severity), (Option<u32>, Option<u32>)> = HashMap::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let company = canonical_company(record.get(company_col).unwrap_or(""));
        if company.is_empty() {
            warnings.push(format!("data row {row}: empty CRM Company, row skipped"));
            continue;
        }

        for (col, severity, kind) in &severity_cols {
            let raw = record.get(*col).unwrap_or("").trim();
            if raw.is_empty() {
                continue;
            }
            match parse_minutes(raw) {
                Some(minutes) => {
                    let slot = cells.entry((company.clone(), *severity)).or_insert((None, None));
                    match kind {
                        BudgetKind::FirstResponse => slot.0 = Some(minutes),
                        BudgetKind::Resolution => slot.1 = Some(minutes),
                    }
                }
                None => warnings.push(format!(
                    "data row {row}: {company} {severity}: expected positive whole minutes, got {raw:?}; cell ignored"
                )),
            }
        }
    }

    let mut pairs: Vec<_> = cells.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut thresholds = Vec::new();
    for ((company, severity), budgets) in pairs {
        match budgets {
            (Some(fr), Some(res)) => thresholds.push(SlaThreshold {
                company,
                severity,
                first_response_minutes: fr,
                resolution_minutes: res,
            }),
            (Some(_), None) => warnings.push(format!(
                "{company} {severity}: First Response budget without Resolution, pair skipped"
            )),
            (None, Some(_)) => warnings.push(format!(
                "{company} {severity}: Resolution budget without First Response, pair skipped"
            )),
            (None, None) => {}
        }
    }

    Ok(ThresholdBatch {
        thresholds,
        warnings,
    })
}

// ───────────────────────────────────────
// Field helpers
// ───────────────────────────────────────

fn field_of<'r>(
    record: &'r csv::StringRecord,
    columns: &HashMap<&str, usize>,
    col: &str,
) -> &'r str {
    columns
        .get(col)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
        .trim()
}

fn opt_string(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn optional_timestamp(
    raw: &str,
    row: usize,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>, IngestError> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_timestamp(raw)
        .map(Some)
        .map_err(|e| IngestError::InvalidField {
            row,
            column,
            message: format!("unparsable timestamp {raw:?}: {e}"),
        })
}

fn required_timestamp(
    raw: &str,
    row: usize,
    column: &'static str,
) -> Result<DateTime<Utc>, IngestError> {
    optional_timestamp(raw, row, column)?.ok_or_else(|| IngestError::InvalidField {
        row,
        column,
        message: "missing required timestamp".into(),
    })
}

/// Minute budgets are positive whole numbers; "120.0" from spreadsheet
/// exports is accepted, anything else is not.
fn parse_minutes(raw: &str) -> Option<u32> {
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}
