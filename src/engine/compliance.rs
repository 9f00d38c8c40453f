// src/engine/compliance.rs

use serde::Serialize;

use crate::models::{SlaThreshold, Ticket};

use super::stats::{finite, round2};

/// Compliance outcome for one SLA dimension of one ticket.
///
/// An explicit tagged state, not a nullable boolean: aggregation treats
/// the two indeterminate arms differently from a violation (coverage %
/// vs. violation %), and the violations view lists `MissingData` rows
/// but not `NoThreshold` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    Compliant,
    Violated,
    /// A required date is absent; the ticket cannot be judged.
    MissingData,
    /// No SLA row exists for this company × severity.
    NoThreshold,
}

impl Compliance {
    pub fn is_violated(self) -> bool {
        self == Compliance::Violated
    }

    /// Counts toward the headline compliance percentage.
    pub fn is_evaluable(self) -> bool {
        matches!(self, Compliance::Compliant | Compliance::Violated)
    }

    pub fn is_missing_data(self) -> bool {
        self == Compliance::MissingData
    }
}

/// Per-request derivation over a raw ticket; never persisted.
#[derive(Debug)]
pub struct EnrichedTicket<'a> {
    pub ticket: &'a Ticket,
    /// Whole minutes from created to resolved, clamped at 0. Present iff
    /// both instants are.
    pub resolution_elapsed_minutes: Option<i64>,
    pub first_response: Compliance,
    pub first_response_percent_exceeded: Option<f64>,
    pub resolution: Compliance,
    pub resolution_percent_exceeded: Option<f64>,
    pub is_reopen_heavy: bool,
    /// Data-quality condition: resolved-at preceded created-at.
    pub negative_elapsed_clamped: bool,
}

impl EnrichedTicket<'_> {
    pub fn is_eligible(&self) -> bool {
        self.ticket.is_eligible()
    }
}

/// Pure per-ticket derivation; `threshold` is the resolver outcome.
pub fn enrich<'a>(ticket: &'a Ticket, threshold: Option<&SlaThreshold>) -> EnrichedTicket<'a> {
    let mut negative_elapsed_clamped = false;
    let resolution_elapsed_minutes = ticket.resolved.map(|resolved| {
        let minutes = (resolved - ticket.created).num_minutes();
        if minutes < 0 {
            negative_elapsed_clamped = true;
            0
        } else {
            minutes
        }
    });

    // First response: needs both dates, never the threshold. Boundary
    // equality (actual == target) is compliant.
    let (first_response, first_response_percent_exceeded) =
        match (ticket.fr_actual, ticket.fr_target) {
            (Some(actual), Some(target)) => {
                if actual <= target {
                    (Compliance::Compliant, None)
                } else {
                    let overrun = (actual - target).num_minutes() as f64;
                    // Overrun is relative to the created→target window, not
                    // the resolution budget; window clamped to ≥ 1 minute.
                    let window = (target - ticket.created).num_minutes().max(1) as f64;
                    let pct = finite(round2(overrun / window * 100.0));
                    (Compliance::Violated, pct)
                }
            }
            _ => (Compliance::MissingData, None),
        };

    let budget = threshold
        .map(|t| i64::from(t.resolution_minutes))
        .filter(|b| *b > 0);
    let (resolution, resolution_percent_exceeded) = match (resolution_elapsed_minutes, budget) {
        (Some(elapsed), Some(budget)) => {
            if elapsed <= budget {
                (Compliance::Compliant, None)
            } else {
                let pct = (elapsed - budget) as f64 / budget as f64 * 100.0;
                (Compliance::Violated, finite(round2(pct)))
            }
        }
        (None, _) => (Compliance::MissingData, None),
        (Some(_), None) => (Compliance::NoThreshold, None),
    };

    EnrichedTicket {
        ticket,
        resolution_elapsed_minutes,
        first_response,
        first_response_percent_exceeded,
        resolution,
        resolution_percent_exceeded,
        is_reopen_heavy: ticket.reopen_count > 1,
        negative_elapsed_clamped,
    }
}
