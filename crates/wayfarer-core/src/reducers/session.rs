//! Session reducer: the composed derived state.
//!
//! Scope of each component:
//! - JourneyView is branch-aware: it tracks the active head and every tip.
//! - LearnedView is global across the whole DAG; knowledge from abandoned
//!   branches is kept.
//! - ArtifactView is global with supersedence history.

use crate::model::views::SessionState;
use crate::model::EventEnvelope;
use crate::reducers::{reduce_artifacts, reduce_journey, reduce_learned};

/// Reduce all events of a session to a complete [`SessionState`].
///
/// An empty slice yields the sentinel state: zero events, `last_event_seq`
/// of -1, no timestamp.
#[must_use]
pub fn reduce_session_state(session_id: &str, events: &[EventEnvelope]) -> SessionState {
    let last = events.last();
    SessionState {
        session_id: session_id.to_string(),
        journey: reduce_journey(events),
        learned: reduce_learned(events),
        artifacts: reduce_artifacts(events),
        event_count: events.len(),
        last_event_seq: last.map_or(-1, |e| e.seq as i64),
        last_event_ts: last.map(|e| e.ts),
    }
}
