//! Derived view models computed from the event log.
//!
//! These are the read-side projections: where the user is (`JourneyView`),
//! what is known about them (`LearnedView`), and what has been produced
//! (`ArtifactView`). Views are recomputed from the log on every query and
//! never persisted, so every map here is a `BTreeMap` — deterministic
//! iteration means deterministic JSON output for identical logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ArtifactKind, EvidenceRef, SideEffects, DEFAULT_HEAD};

// =============================================================================
// JOURNEY VIEW
// =============================================================================

/// A waypoint the user has visited, in visit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitedWaypoint {
    pub waypoint_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
}

/// The tip (highest-seq event) of a branch in the journey DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTip {
    pub head_id: String,
    pub event_id: String,
    pub waypoint_id: Option<String>,
    pub seq: u64,
}

/// Where the user currently is in their journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyView {
    // Current position
    pub head_event_id: Option<String>,
    pub current_waypoint_id: Option<String>,
    pub active_head_id: String,

    // Active trail
    pub active_trail_version_id: Option<String>,

    // Branch state
    pub branch_tips: BTreeMap<String, BranchTip>,

    // History
    pub visited_waypoints: Vec<VisitedWaypoint>,

    // Event ids the user can jump back to
    pub backtrack_targets: Vec<String>,
}

impl Default for JourneyView {
    fn default() -> Self {
        Self {
            head_event_id: None,
            current_waypoint_id: None,
            active_head_id: DEFAULT_HEAD.to_string(),
            active_trail_version_id: None,
            branch_tips: BTreeMap::new(),
            visited_waypoints: Vec::new(),
            backtrack_targets: Vec::new(),
        }
    }
}

// =============================================================================
// LEARNED VIEW
// =============================================================================

/// A single learned item with confidence and evidence.
///
/// Confidence is clamped to [0.0, 1.0]; evidence is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedRecord {
    pub id: String,
    /// Carried by preferences and constraints; always `None` for concepts.
    pub value: Option<serde_json::Value>,
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    pub updated_at_seq: u64,
}

impl LearnedRecord {
    /// A fresh record at zero confidence.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            confidence: 0.0,
            evidence: Vec::new(),
            updated_at_seq: 0,
        }
    }
}

/// What the system has learned about the user.
///
/// Branch-agnostic: learning accumulates across all heads and is never
/// erased by backtracking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LearnedView {
    pub preferences: BTreeMap<String, LearnedRecord>,
    pub constraints: BTreeMap<String, LearnedRecord>,
    pub concepts: BTreeMap<String, LearnedRecord>,
}

// =============================================================================
// ARTIFACT VIEW
// =============================================================================

/// An artifact plus its provenance and supersedence status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub artifact_id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub title: Option<String>,
    pub content_ref: String,
    pub produced_at_waypoint_id: Option<String>,
    pub produced_by_event_id: String,
    pub produced_at_seq: u64,
    pub reversible: bool,
    pub side_effects: SideEffects,

    // Supersedence tracking
    pub superseded_by: Option<String>,
    pub is_active: bool,
}

/// All artifacts produced during the journey.
///
/// Artifacts are never deleted, only superseded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactView {
    pub artifacts: BTreeMap<String, ArtifactRecord>,
}

impl ArtifactView {
    /// The artifacts that have not been superseded.
    #[must_use]
    pub fn active_artifacts(&self) -> BTreeMap<&str, &ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|(_, a)| a.is_active)
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// The artifacts that have been superseded.
    #[must_use]
    pub fn superseded_artifacts(&self) -> BTreeMap<&str, &ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|(_, a)| !a.is_active)
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Complete derived state for a session: the three views plus log metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub journey: JourneyView,
    pub learned: LearnedView,
    pub artifacts: ArtifactView,

    pub event_count: usize,
    /// Highest seq in the session, or -1 for an empty log.
    pub last_event_seq: i64,
    pub last_event_ts: Option<DateTime<Utc>>,
}

impl SessionState {
    /// The state of a session with no events.
    #[must_use]
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            journey: JourneyView::default(),
            learned: LearnedView::default(),
            artifacts: ArtifactView::default(),
            event_count: 0,
            last_event_seq: -1,
            last_event_ts: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_sentinels() {
        let state = SessionState::empty("s1");
        assert_eq!(state.event_count, 0);
        assert_eq!(state.last_event_seq, -1);
        assert!(state.last_event_ts.is_none());
        assert_eq!(state.journey.active_head_id, DEFAULT_HEAD);
        assert!(state.journey.branch_tips.is_empty());
    }

    #[test]
    fn artifact_view_partitions_by_activity() {
        let mut view = ArtifactView::default();
        for (id, active) in [("a1", false), ("a2", true)] {
            view.artifacts.insert(
                id.to_string(),
                ArtifactRecord {
                    artifact_id: id.to_string(),
                    kind: ArtifactKind::Code,
                    title: None,
                    content_ref: "file://x".to_string(),
                    produced_at_waypoint_id: None,
                    produced_by_event_id: "e".to_string(),
                    produced_at_seq: 0,
                    reversible: true,
                    side_effects: SideEffects::None,
                    superseded_by: if active { None } else { Some("a2".to_string()) },
                    is_active: active,
                },
            );
        }
        assert_eq!(view.active_artifacts().len(), 1);
        assert!(view.active_artifacts().contains_key("a2"));
        assert_eq!(view.superseded_artifacts().len(), 1);
        assert!(view.superseded_artifacts().contains_key("a1"));
    }
}
