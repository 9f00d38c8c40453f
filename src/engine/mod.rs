// src/engine/mod.rs
//
// The compliance computation and aggregation engine. Everything in here is
// a pure function of an immutable (tickets, thresholds) snapshot pair; no
// I/O, no ambient state.

pub mod compliance;
pub mod normalize;
pub mod reports;
pub mod resolve;
pub mod stats;

use crate::models::{SlaThreshold, Ticket};

use compliance::EnrichedTicket;
use normalize::company_join_key;
use resolve::ThresholdIndex;

/// Resolve and enrich every ticket against the threshold matrix.
/// Recomputed per report request; the result is never cached.
pub fn enrich_all<'a>(
    tickets: &'a [Ticket],
    thresholds: &'a [SlaThreshold],
) -> Vec<EnrichedTicket<'a>> {
    let index = ThresholdIndex::build(thresholds);
    tickets
        .iter()
        .map(|ticket| {
            let threshold = index.resolve(&company_join_key(&ticket.company), ticket.severity);
            compliance::enrich(ticket, threshold)
        })
        .collect()
}
