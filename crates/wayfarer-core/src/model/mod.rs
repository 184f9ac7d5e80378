//! # Event Model
//!
//! The immutable data shapes every other component consumes:
//! - The common event envelope (`EventEnvelope`)
//! - The 14 typed payloads (`EventPayload`)
//! - Error types (`WayfarerError`)
//!
//! Events are append-only and form a DAG via `parent_event_id`.
//! The `head_id` identifies which branch an event belongs to.
//!
//! ## Wire format
//!
//! The payload union is adjacently tagged, so one JSON object carries both
//! the discriminant and the type-specific data:
//!
//! ```json
//! { "event_id": "...", "seq": 3, "type": "WaypointEntered",
//!   "payload": { "waypoint_id": "w1", "via": "next" } }
//! ```
//!
//! Each event type has exactly one valid payload shape by construction:
//! an unknown type or a mismatched payload fails deserialization and never
//! reaches the store.

pub mod views;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// The branch every session starts on.
pub const DEFAULT_HEAD: &str = "main";

fn default_head_id() -> String {
    DEFAULT_HEAD.to_string()
}

// =============================================================================
// EVENT TYPE
// =============================================================================

/// All event types in Wayfarer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    IntentCreated,
    TrailVersionCreated,
    WaypointEntered,
    ChoiceMade,
    StepCompleted,
    Blocked,
    Backtracked,
    Replanned,
    Merged,
    ArtifactCreated,
    ArtifactSuperseded,
    PreferenceLearned,
    ConceptLearned,
    ConstraintLearned,
}

impl EventType {
    /// The wire name of this event type (also the tag value in JSON).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IntentCreated => "IntentCreated",
            Self::TrailVersionCreated => "TrailVersionCreated",
            Self::WaypointEntered => "WaypointEntered",
            Self::ChoiceMade => "ChoiceMade",
            Self::StepCompleted => "StepCompleted",
            Self::Blocked => "Blocked",
            Self::Backtracked => "Backtracked",
            Self::Replanned => "Replanned",
            Self::Merged => "Merged",
            Self::ArtifactCreated => "ArtifactCreated",
            Self::ArtifactSuperseded => "ArtifactSuperseded",
            Self::PreferenceLearned => "PreferenceLearned",
            Self::ConceptLearned => "ConceptLearned",
            Self::ConstraintLearned => "ConstraintLearned",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = WayfarerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IntentCreated" => Ok(Self::IntentCreated),
            "TrailVersionCreated" => Ok(Self::TrailVersionCreated),
            "WaypointEntered" => Ok(Self::WaypointEntered),
            "ChoiceMade" => Ok(Self::ChoiceMade),
            "StepCompleted" => Ok(Self::StepCompleted),
            "Blocked" => Ok(Self::Blocked),
            "Backtracked" => Ok(Self::Backtracked),
            "Replanned" => Ok(Self::Replanned),
            "Merged" => Ok(Self::Merged),
            "ArtifactCreated" => Ok(Self::ArtifactCreated),
            "ArtifactSuperseded" => Ok(Self::ArtifactSuperseded),
            "PreferenceLearned" => Ok(Self::PreferenceLearned),
            "ConceptLearned" => Ok(Self::ConceptLearned),
            "ConstraintLearned" => Ok(Self::ConstraintLearned),
            other => Err(WayfarerError::Validation(format!(
                "unknown event type: {other}"
            ))),
        }
    }
}

// =============================================================================
// ACTOR & EVIDENCE
// =============================================================================

/// Who or what created the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    User,
    System,
}

/// Who created the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub kind: ActorKind,
    #[serde(default)]
    pub id: Option<String>,
}

impl Actor {
    /// A system actor with no identifier (the server-side default).
    #[must_use]
    pub const fn system() -> Self {
        Self {
            kind: ActorKind::System,
            id: None,
        }
    }
}

/// What an evidence reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Artifact,
    Event,
}

/// Reference to evidence supporting a learned update.
///
/// The target id is stored as-is; dangling references are tolerated and
/// surfaced by diagnostics, never rejected by the reducers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub kind: EvidenceKind,
    pub id: String,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// TRAIL SHAPES (plans)
// =============================================================================

/// Types of waypoints in a trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    Checkpoint,
    Action,
    Branch,
    Milestone,
}

/// A waypoint in a trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub title: String,
    pub kind: WaypointKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    Easy,
    Partial,
    Hard,
}

/// An option at a branch point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeOption {
    pub option_id: String,
    pub title: String,
    pub to: String,
    #[serde(default)]
    pub effort: Option<Effort>,
    #[serde(default)]
    pub reversibility: Option<Reversibility>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeLabel {
    Next,
    Options,
}

/// An edge connecting waypoints in a trail version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEdge {
    #[serde(rename = "from")]
    pub from: String,
    pub to: String,
    pub label: EdgeLabel,
    #[serde(default)]
    pub options: Option<Vec<EdgeOption>>,
}

// =============================================================================
// NAVIGATION SHAPES
// =============================================================================

/// How a waypoint was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryVia {
    Next,
    Jump,
    Backtrack,
    Replan,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedBy {
    System,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceReasonKind {
    MatchesPreference,
    LowFriction,
    FitsConstraints,
    TeachesGoal,
    Unblocks,
}

/// A reason for making a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceReason {
    pub kind: ChoiceReasonKind,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Why a choice was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRationale {
    #[serde(default)]
    pub suggested_by: Option<SuggestedBy>,
    #[serde(default)]
    pub reasons: Option<Vec<ChoiceReason>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    OkWithNotes,
}

/// Categories of blockers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Confusion,
    Tooling,
    RuntimeError,
    MissingInfo,
    ExternalDependency,
}

/// Types of suggested next actions when blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedNextKind {
    BacktrackOne,
    SwitchPath,
    AskQuestion,
    Simplify,
    Replan,
}

/// A suggested next action when blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedNext {
    pub kind: SuggestedNextKind,
    #[serde(default)]
    pub detail: Option<String>,
}

/// How far back a backtrack goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktrackMode {
    OneStep,
    Jump,
}

/// Artifact retention policy on backtrack. Only "all" exists: backtracking
/// never destroys produced outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepArtifacts {
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnedKind {
    Preference,
    Concept,
    Constraint,
}

/// Reference to a learned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedRef {
    pub kind: LearnedKind,
    pub id: String,
}

/// What triggered a replan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanBasedOn {
    #[serde(default)]
    pub learned_refs: Option<Vec<LearnedRef>>,
    #[serde(default)]
    pub triggering_event_id: Option<String>,
}

// =============================================================================
// ARTIFACT SHAPES
// =============================================================================

/// Types of artifacts produced during the journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Doc,
    Config,
    RunLog,
    Screenshot,
    Other,
}

/// Side effects of producing an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffects {
    #[default]
    None,
    Local,
    Remote,
}

fn default_true() -> bool {
    true
}

/// An artifact produced during the journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub artifact_id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    #[serde(default)]
    pub title: Option<String>,
    pub content_ref: String,
    #[serde(default)]
    pub produced_at_waypoint_id: Option<String>,
    #[serde(default = "default_true")]
    pub reversible: bool,
    #[serde(default)]
    pub side_effects: SideEffects,
}

// =============================================================================
// COMFORT LEVEL (intent)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortLevel {
    GuideMeClosely,
    ExplainAsWeGo,
    LetMeExplore,
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload for `IntentCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCreatedPayload {
    pub goal: String,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub starting_point: Option<String>,
    #[serde(default)]
    pub constraints: Option<Vec<BTreeMap<String, String>>>,
    #[serde(default)]
    pub comfort_level: Option<ComfortLevel>,
}

/// Payload for `TrailVersionCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailVersionCreatedPayload {
    pub trail_version_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub edges: Vec<TrailEdge>,
}

/// Payload for `WaypointEntered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaypointEnteredPayload {
    pub waypoint_id: String,
    #[serde(default)]
    pub via: Option<EntryVia>,
    #[serde(default)]
    pub from_waypoint_id: Option<String>,
}

/// Payload for `ChoiceMade`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMadePayload {
    pub from_waypoint_id: String,
    pub option_id: String,
    pub to_waypoint_id: String,
    #[serde(default)]
    pub rationale: Option<ChoiceRationale>,
}

/// Payload for `StepCompleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCompletedPayload {
    pub waypoint_id: String,
    pub outcome: StepOutcome,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence: Option<Vec<EvidenceRef>>,
}

/// Payload for `Blocked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPayload {
    pub waypoint_id: String,
    pub summary: String,
    #[serde(default)]
    pub category: Option<BlockCategory>,
    pub retryable: bool,
    #[serde(default)]
    pub suggested_next: Option<Vec<SuggestedNext>>,
    #[serde(default)]
    pub evidence: Option<Vec<EvidenceRef>>,
}

/// Payload for `Backtracked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktrackedPayload {
    pub from_event_id: String,
    pub to_event_id: String,
    pub mode: BacktrackMode,
    #[serde(default)]
    pub keep_artifacts: KeepArtifacts,
    #[serde(default)]
    pub note: Option<String>,
}

/// Payload for `Replanned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplannedPayload {
    pub from_trail_version_id: String,
    pub to_trail_version_id: String,
    pub reason: String,
    #[serde(default)]
    pub based_on: Option<ReplanBasedOn>,
}

/// Payload for `Merged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedPayload {
    pub merged_from_heads: Vec<String>,
    pub merged_from_event_ids: Vec<String>,
    pub merge_waypoint_id: String,
    pub result_head_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for `ArtifactCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCreatedPayload {
    pub artifact: ArtifactSpec,
}

/// Payload for `ArtifactSuperseded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSupersededPayload {
    pub artifact_id: String,
    pub superseded_by_artifact_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Payload for `PreferenceLearned`.
///
/// `value` is an open scalar (string, number, or bool); `confidence_delta`
/// must be within [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceLearnedPayload {
    pub preference_id: String,
    pub value: serde_json::Value,
    pub confidence_delta: f64,
    #[serde(default)]
    pub evidence: Option<Vec<EvidenceRef>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Payload for `ConceptLearned`. Concepts carry no value, only confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptLearnedPayload {
    pub concept_id: String,
    pub confidence_delta: f64,
    #[serde(default)]
    pub evidence: Option<Vec<EvidenceRef>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Payload for `ConstraintLearned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintLearnedPayload {
    pub constraint_id: String,
    pub value: serde_json::Value,
    pub confidence_delta: f64,
    #[serde(default)]
    pub evidence: Option<Vec<EvidenceRef>>,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// PAYLOAD UNION
// =============================================================================

/// The typed payload union for all 14 event types.
///
/// Adjacently tagged: `"type"` carries the discriminant, `"payload"` the
/// type-specific data. Flattened into [`EventEnvelope`], this yields the
/// line-delimited interchange format unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventPayload {
    IntentCreated(IntentCreatedPayload),
    TrailVersionCreated(TrailVersionCreatedPayload),
    WaypointEntered(WaypointEnteredPayload),
    ChoiceMade(ChoiceMadePayload),
    StepCompleted(StepCompletedPayload),
    Blocked(BlockedPayload),
    Backtracked(BacktrackedPayload),
    Replanned(ReplannedPayload),
    Merged(MergedPayload),
    ArtifactCreated(ArtifactCreatedPayload),
    ArtifactSuperseded(ArtifactSupersededPayload),
    PreferenceLearned(PreferenceLearnedPayload),
    ConceptLearned(ConceptLearnedPayload),
    ConstraintLearned(ConstraintLearnedPayload),
}

impl EventPayload {
    /// The event type this payload belongs to.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::IntentCreated(_) => EventType::IntentCreated,
            Self::TrailVersionCreated(_) => EventType::TrailVersionCreated,
            Self::WaypointEntered(_) => EventType::WaypointEntered,
            Self::ChoiceMade(_) => EventType::ChoiceMade,
            Self::StepCompleted(_) => EventType::StepCompleted,
            Self::Blocked(_) => EventType::Blocked,
            Self::Backtracked(_) => EventType::Backtracked,
            Self::Replanned(_) => EventType::Replanned,
            Self::Merged(_) => EventType::Merged,
            Self::ArtifactCreated(_) => EventType::ArtifactCreated,
            Self::ArtifactSuperseded(_) => EventType::ArtifactSuperseded,
            Self::PreferenceLearned(_) => EventType::PreferenceLearned,
            Self::ConceptLearned(_) => EventType::ConceptLearned,
            Self::ConstraintLearned(_) => EventType::ConstraintLearned,
        }
    }

    /// The confidence delta carried by learning payloads, if any.
    #[must_use]
    pub fn confidence_delta(&self) -> Option<f64> {
        match self {
            Self::PreferenceLearned(p) => Some(p.confidence_delta),
            Self::ConceptLearned(p) => Some(p.confidence_delta),
            Self::ConstraintLearned(p) => Some(p.confidence_delta),
            _ => None,
        }
    }
}

// =============================================================================
// EVENT ENVELOPE
// =============================================================================

/// The common envelope for all Wayfarer events.
///
/// Immutable once persisted. `seq` is the per-session total order;
/// `parent_event_id` forms the causal DAG independently of `seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub session_id: String,
    pub seq: u64,
    pub ts: DateTime<Utc>,

    // Causal links
    #[serde(default)]
    pub parent_event_id: Option<String>,
    #[serde(default = "default_head_id")]
    pub head_id: String,

    // Context references
    #[serde(default)]
    pub trail_version_id: Option<String>,
    #[serde(default)]
    pub waypoint_id: Option<String>,

    // Who created it
    pub actor: Actor,

    // Event-specific data ("type" + "payload" on the wire)
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// The event type, derived from the payload.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Validate envelope fields before persistence.
    ///
    /// Rejects empty identifiers and out-of-range confidence deltas.
    /// Payload shape mismatches never get this far: they fail
    /// deserialization.
    pub fn validate(&self) -> Result<(), WayfarerError> {
        if self.event_id.is_empty() {
            return Err(WayfarerError::Validation("event_id must not be empty".into()));
        }
        if self.session_id.is_empty() {
            return Err(WayfarerError::Validation(
                "session_id must not be empty".into(),
            ));
        }
        if self.head_id.is_empty() {
            return Err(WayfarerError::Validation("head_id must not be empty".into()));
        }
        if let Some(delta) = self.payload.confidence_delta()
            && !(-1.0..=1.0).contains(&delta)
        {
            return Err(WayfarerError::Validation(format!(
                "confidence_delta {delta} outside [-1, 1]"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Wayfarer core.
///
/// - `Conflict` and `Validation` are recoverable and distinguishable;
///   callers map them to 409/422-style responses.
/// - Read-path misses are `NotFound` or empty results, never a panic.
/// - The core should never panic; all errors are explicit values.
#[derive(Debug, Error)]
pub enum WayfarerError {
    /// Duplicate `event_id` or duplicate `(session_id, seq)` on write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested session/event/head does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed envelope or payload; rejected before reaching the store.
    #[error("validation: {0}")]
    Validation(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A storage-engine failure (disk, corruption). Not retried by the core.
    #[error("storage error: {0}")]
    Storage(String),
}

impl WayfarerError {
    /// True for uniqueness violations the caller can recover from.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
