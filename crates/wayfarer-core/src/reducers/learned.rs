//! Learned reducer: what the system knows about the user.
//!
//! Aggregates PreferenceLearned, ConceptLearned, and ConstraintLearned into
//! per-id records with clamped confidence and accumulated evidence.
//!
//! Key invariant: learning persists across backtracking. The fold ignores
//! `head_id` entirely, so knowledge gained on an abandoned branch is kept.

use crate::model::views::{LearnedRecord, LearnedView};
use crate::model::{EventEnvelope, EventPayload, EvidenceRef};
use std::collections::BTreeMap;

/// Clamp a confidence value to [0.0, 1.0].
#[must_use]
pub fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Reduce an ordered event slice to a [`LearnedView`].
#[must_use]
pub fn reduce_learned(events: &[EventEnvelope]) -> LearnedView {
    let mut view = LearnedView::default();

    for event in events {
        match &event.payload {
            EventPayload::PreferenceLearned(payload) => {
                update_record(
                    &mut view.preferences,
                    &payload.preference_id,
                    value_of(&payload.value),
                    payload.confidence_delta,
                    payload.evidence.as_deref(),
                    event.seq,
                );
            }
            EventPayload::ConceptLearned(payload) => {
                // Concepts carry no value, only confidence
                update_record(
                    &mut view.concepts,
                    &payload.concept_id,
                    None,
                    payload.confidence_delta,
                    payload.evidence.as_deref(),
                    event.seq,
                );
            }
            EventPayload::ConstraintLearned(payload) => {
                update_record(
                    &mut view.constraints,
                    &payload.constraint_id,
                    value_of(&payload.value),
                    payload.confidence_delta,
                    payload.evidence.as_deref(),
                    event.seq,
                );
            }
            _ => {}
        }
    }

    view
}

/// JSON null on the wire means "no new value": keep what is already known.
fn value_of(value: &serde_json::Value) -> Option<serde_json::Value> {
    if value.is_null() {
        None
    } else {
        Some(value.clone())
    }
}

fn update_record(
    records: &mut BTreeMap<String, LearnedRecord>,
    id: &str,
    value: Option<serde_json::Value>,
    confidence_delta: f64,
    evidence: Option<&[EvidenceRef]>,
    seq: u64,
) {
    let record = records
        .entry(id.to_string())
        .or_insert_with(|| LearnedRecord::new(id));

    record.confidence = clamp(record.confidence + confidence_delta);
    if value.is_some() {
        record.value = value;
    }
    if let Some(evidence) = evidence {
        record.evidence.extend_from_slice(evidence);
    }
    record.updated_at_seq = seq;
}

/// Concept ids at or above the confidence threshold, sorted.
#[must_use]
pub fn high_confidence_concepts(view: &LearnedView, threshold: f64) -> Vec<String> {
    view.concepts
        .iter()
        .filter(|(_, record)| record.confidence >= threshold)
        .map(|(id, _)| id.clone())
        .collect()
}
