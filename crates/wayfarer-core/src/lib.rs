//! # wayfarer-core
//!
//! The deterministic event-sourcing core for Wayfarer - THE LOG.
//!
//! Wayfarer records a learner's journey as an append-only log of typed
//! events and derives every piece of state by replaying that log through
//! pure reducers. Nothing derived is ever persisted; the log is the single
//! source of truth.
//!
//! ## Architectural Constraints
//!
//! - Events are immutable once written; the store only appends
//! - `(session_id, seq)` is a gapless-by-default total order per session;
//!   `parent_event_id` forms the causal DAG independently of it
//! - Reducers are pure folds: no I/O, no clocks, deterministic output
//! - NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod model;
pub mod ontology;
pub mod reducers;
pub mod store;

// =============================================================================
// RE-EXPORTS: Event Model
// =============================================================================

pub use model::{
    Actor, ActorKind, ArtifactKind, ArtifactSpec, BacktrackMode, BlockCategory, EntryVia,
    EventEnvelope, EventPayload, EventType, EvidenceKind, EvidenceRef, SideEffects, StepOutcome,
    TrailEdge, Waypoint, WaypointKind, WayfarerError, DEFAULT_HEAD,
};

pub use model::views::{
    ArtifactRecord, ArtifactView, BranchTip, JourneyView, LearnedRecord, LearnedView,
    SessionState, VisitedWaypoint,
};

// =============================================================================
// RE-EXPORTS: Store & Reducers
// =============================================================================

pub use store::{EventFilter, EventStore};

pub use reducers::{
    artifact_chain, branch_divergence_point, clamp, high_confidence_concepts, path_to_waypoint,
    reduce_artifacts, reduce_journey, reduce_learned, reduce_session_state,
};

// =============================================================================
// RE-EXPORTS: Ontology
// =============================================================================

pub use ontology::{ConceptId, ConstraintId, PreferenceId};
