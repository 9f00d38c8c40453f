// src/engine/reports.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Severity;

use super::compliance::{Compliance, EnrichedTicket};
use super::stats::{finite, mean, median, percentile, round2};

// ───────────────────────────────────────
// Report rows
// ───────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AssigneeAverage {
    pub assignee: String,
    pub ticket_count: usize,
    pub avg_resolution_minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct ProductAverage {
    pub product: String,
    pub ticket_count: usize,
    pub avg_resolution_minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct ViolationRow {
    pub issue_key: String,
    pub created: DateTime<Utc>,
    pub assignee: Option<String>,
    pub product: Option<String>,
    pub reopen_count: u32,
    pub first_response: Compliance,
    pub first_response_percent_exceeded: Option<f64>,
    pub resolution: Compliance,
    pub resolution_percent_exceeded: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReopenRow {
    pub reopen_count: u32,
    pub issue_key: String,
    pub summary: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
    pub assignee: Option<String>,
    pub product: Option<String>,
    pub first_response_percent_exceeded: Option<f64>,
    pub resolution_percent_exceeded: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SeverityCompliance {
    pub severity: Severity,
    pub evaluable_tickets: usize,
    pub compliant: usize,
    pub violated: usize,
    pub compliance_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_tickets: usize,
    pub eligible_tickets: usize,
    pub evaluable_tickets: usize,
    pub compliant: usize,
    pub violated: usize,
    pub missing_data: usize,
    pub no_threshold: usize,
    /// compliant / (compliant + violated); indeterminates excluded from
    /// both sides and reported via `coverage_pct` instead.
    pub resolution_compliance_pct: Option<f64>,
    pub coverage_pct: Option<f64>,
    pub median_resolution_minutes: Option<f64>,
    pub p90_resolution_minutes: Option<f64>,
    pub by_severity: Vec<SeverityCompliance>,
}

// ───────────────────────────────────────
// The five views
// ───────────────────────────────────────

pub fn assignee_averages(rows: &[EnrichedTicket]) -> Vec<AssigneeAverage> {
    averages_by(rows, |row| row.ticket.assignee.as_deref())
        .into_iter()
        .map(|(assignee, ticket_count, avg)| AssigneeAverage {
            assignee,
            ticket_count,
            avg_resolution_minutes: avg,
        })
        .collect()
}

pub fn product_averages(rows: &[EnrichedTicket]) -> Vec<ProductAverage> {
    averages_by(rows, |row| row.ticket.product.as_deref())
        .into_iter()
        .map(|(product, ticket_count, avg)| ProductAverage {
            product,
            ticket_count,
            avg_resolution_minutes: avg,
        })
        .collect()
}

/// Eligible tickets that violated either SLA dimension, or whose dates are
/// too incomplete to judge ("missing SLA data" — distinct from a breach).
/// Tickets whose only gap is an absent threshold row are not listed here.
pub fn violations(rows: &[EnrichedTicket]) -> Vec<ViolationRow> {
    let mut out: Vec<ViolationRow> = rows
        .iter()
        .filter(|row| row.is_eligible())
        .filter(|row| {
            row.first_response.is_violated()
                || row.resolution.is_violated()
                || row.first_response.is_missing_data()
                || row.resolution.is_missing_data()
        })
        .map(|row| ViolationRow {
            issue_key: row.ticket.issue_key.clone(),
            created: row.ticket.created,
            assignee: row.ticket.assignee.clone(),
            product: row.ticket.product.clone(),
            reopen_count: row.ticket.reopen_count,
            first_response: row.first_response,
            first_response_percent_exceeded: row.first_response_percent_exceeded,
            resolution: row.resolution,
            resolution_percent_exceeded: row.resolution_percent_exceeded,
        })
        .collect();

    out.sort_by(|a, b| {
        desc_nulls_last(a.resolution_percent_exceeded, b.resolution_percent_exceeded)
            .then_with(|| {
                desc_nulls_last(
                    a.first_response_percent_exceeded,
                    b.first_response_percent_exceeded,
                )
            })
            .then_with(|| a.created.cmp(&b.created))
    });
    out
}

/// Reopen tracking is independent of closure: every status is listed.
/// Ordering: reopen count descending, ties oldest-created first.
pub fn reopen_heavy(rows: &[EnrichedTicket]) -> Vec<ReopenRow> {
    let mut out: Vec<ReopenRow> = rows
        .iter()
        .filter(|row| row.is_reopen_heavy)
        .map(|row| ReopenRow {
            reopen_count: row.ticket.reopen_count,
            issue_key: row.ticket.issue_key.clone(),
            summary: row.ticket.summary.clone(),
            status: row.ticket.status.clone(),
            created: row.ticket.created,
            assignee: row.ticket.assignee.clone(),
            product: row.ticket.product.clone(),
            first_response_percent_exceeded: row.first_response_percent_exceeded,
            resolution_percent_exceeded: row.resolution_percent_exceeded,
        })
        .collect();

    out.sort_by(|a, b| {
        b.reopen_count
            .cmp(&a.reopen_count)
            .then_with(|| a.created.cmp(&b.created))
    });
    out
}

pub fn summary(rows: &[EnrichedTicket]) -> Summary {
    let total_tickets = rows.len();
    let eligible: Vec<&EnrichedTicket> = rows.iter().filter(|row| row.is_eligible()).collect();

    let compliant = count_state(&eligible, Compliance::Compliant);
    let violated = count_state(&eligible, Compliance::Violated);
    let missing_data = count_state(&eligible, Compliance::MissingData);
    let no_threshold = count_state(&eligible, Compliance::NoThreshold);
    let evaluable = compliant + violated;

    let mut elapsed: Vec<f64> = eligible
        .iter()
        .filter(|row| row.resolution.is_evaluable())
        .filter_map(|row| row.resolution_elapsed_minutes)
        .map(|minutes| minutes as f64)
        .collect();
    elapsed.sort_by(f64::total_cmp);

    let by_severity = Severity::ALL
        .iter()
        .filter_map(|&severity| {
            let compliant = eligible
                .iter()
                .filter(|row| row.ticket.severity == severity)
                .filter(|row| row.resolution == Compliance::Compliant)
                .count();
            let violated = eligible
                .iter()
                .filter(|row| row.ticket.severity == severity)
                .filter(|row| row.resolution == Compliance::Violated)
                .count();
            let evaluable = compliant + violated;
            // Severities absent from the data are omitted, not zeroed.
            (evaluable > 0).then(|| SeverityCompliance {
                severity,
                evaluable_tickets: evaluable,
                compliant,
                violated,
                compliance_pct: round2(compliant as f64 / evaluable as f64 * 100.0),
            })
        })
        .collect();

    Summary {
        total_tickets,
        eligible_tickets: eligible.len(),
        evaluable_tickets: evaluable,
        compliant,
        violated,
        missing_data,
        no_threshold,
        resolution_compliance_pct: (evaluable > 0)
            .then(|| round2(compliant as f64 / evaluable as f64 * 100.0))
            .and_then(finite),
        coverage_pct: (!eligible.is_empty())
            .then(|| round2(evaluable as f64 / eligible.len() as f64 * 100.0))
            .and_then(finite),
        median_resolution_minutes: median(&elapsed).and_then(finite).map(round2),
        p90_resolution_minutes: percentile(&elapsed, 90.0).and_then(finite).map(round2),
        by_severity,
    }
}

// ───────────────────────────────────────
// Helpers
// ───────────────────────────────────────

/// Mean resolution minutes over eligible, resolution-evaluable tickets,
/// grouped by `key`. Tickets without a group key and groups with zero
/// evaluable tickets are omitted.
fn averages_by<'a, F>(rows: &'a [EnrichedTicket<'a>], key: F) -> Vec<(String, usize, f64)>
where
    F: Fn(&'a EnrichedTicket<'a>) -> Option<&'a str>,
{
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows
        .iter()
        .filter(|row| row.is_eligible() && row.resolution.is_evaluable())
    {
        let (Some(name), Some(elapsed)) = (key(row), row.resolution_elapsed_minutes) else {
            continue;
        };
        groups.entry(name).or_default().push(elapsed as f64);
    }

    let mut out: Vec<(String, usize, f64)> = groups
        .into_iter()
        .map(|(name, minutes)| {
            let avg = round2(mean(&minutes).unwrap_or(0.0));
            (name.to_string(), minutes.len(), avg)
        })
        .collect();
    out.sort_by(|a, b| {
        a.2.partial_cmp(&b.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    out
}

fn count_state(rows: &[&EnrichedTicket], state: Compliance) -> usize {
    rows.iter().filter(|row| row.resolution == state).count()
}

/// Descending on the value, `None` sorted after every `Some`.
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
