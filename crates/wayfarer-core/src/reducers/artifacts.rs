//! Artifacts reducer: what the journey produced.
//!
//! Builds the full artifact catalogue with supersedence status. Artifacts
//! are never deleted: a record stays in the view forever and flips to
//! inactive when an ArtifactSuperseded event points away from it.

use crate::model::views::{ArtifactRecord, ArtifactView};
use crate::model::{EventEnvelope, EventPayload};
use std::collections::BTreeMap;

/// Reduce an ordered event slice to an [`ArtifactView`].
///
/// Superseding an unknown artifact_id is a no-op: the reducer never errors
/// on log contents.
#[must_use]
pub fn reduce_artifacts(events: &[EventEnvelope]) -> ArtifactView {
    let mut view = ArtifactView::default();

    for event in events {
        match &event.payload {
            EventPayload::ArtifactCreated(payload) => {
                let spec = &payload.artifact;
                view.artifacts.insert(
                    spec.artifact_id.clone(),
                    ArtifactRecord {
                        artifact_id: spec.artifact_id.clone(),
                        kind: spec.kind,
                        title: spec.title.clone(),
                        content_ref: spec.content_ref.clone(),
                        produced_at_waypoint_id: spec.produced_at_waypoint_id.clone(),
                        produced_by_event_id: event.event_id.clone(),
                        produced_at_seq: event.seq,
                        reversible: spec.reversible,
                        side_effects: spec.side_effects,
                        superseded_by: None,
                        is_active: true,
                    },
                );
            }
            EventPayload::ArtifactSuperseded(payload) => {
                if let Some(record) = view.artifacts.get_mut(&payload.artifact_id) {
                    record.superseded_by = Some(payload.superseded_by_artifact_id.clone());
                    record.is_active = false;
                }
            }
            _ => {}
        }
    }

    view
}

/// The supersedence chain ending at the given artifact, oldest to newest.
///
/// Walks the reverse supersedence links back to the original version. An
/// artifact with no history yields a single-element chain.
#[must_use]
pub fn artifact_chain(view: &ArtifactView, artifact_id: &str) -> Vec<String> {
    // superseded_by -> predecessor
    let mut reverse: BTreeMap<&str, &str> = BTreeMap::new();
    for record in view.artifacts.values() {
        if let Some(successor) = &record.superseded_by {
            reverse.insert(successor.as_str(), record.artifact_id.as_str());
        }
    }

    let mut chain = vec![artifact_id.to_string()];
    let mut current = artifact_id;
    while let Some(&predecessor) = reverse.get(current) {
        chain.insert(0, predecessor.to_string());
        current = predecessor;
    }
    chain
}
