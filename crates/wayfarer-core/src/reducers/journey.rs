//! Journey reducer: where the user is.
//!
//! The JourneyView tells you the current waypoint, the active branch, every
//! branch tip, the visit history, and which events are valid backtrack
//! targets.

use crate::model::views::{BranchTip, JourneyView, VisitedWaypoint};
use crate::model::{EntryVia, EventEnvelope, EventPayload, DEFAULT_HEAD};

/// Reduce an ordered event slice to a [`JourneyView`].
///
/// Every event advances its branch tip; `WaypointEntered` moves the current
/// waypoint and records the visit. Entries made via backtrack are excluded
/// from backtrack targets, so the user cannot loop into an undo of an undo.
#[must_use]
pub fn reduce_journey(events: &[EventEnvelope]) -> JourneyView {
    let mut view = JourneyView::default();
    let Some(latest) = events.last() else {
        return view;
    };

    for event in events {
        view.branch_tips.insert(
            event.head_id.clone(),
            BranchTip {
                head_id: event.head_id.clone(),
                event_id: event.event_id.clone(),
                waypoint_id: event.waypoint_id.clone(),
                seq: event.seq,
            },
        );

        match &event.payload {
            EventPayload::TrailVersionCreated(payload) => {
                view.active_trail_version_id = Some(payload.trail_version_id.clone());
            }
            EventPayload::WaypointEntered(payload) => {
                view.current_waypoint_id = Some(payload.waypoint_id.clone());
                view.visited_waypoints.push(VisitedWaypoint {
                    waypoint_id: payload.waypoint_id.clone(),
                    timestamp: event.ts,
                    event_id: event.event_id.clone(),
                });
                if payload.via != Some(EntryVia::Backtrack) {
                    view.backtrack_targets.push(event.event_id.clone());
                }
            }
            // Backtracked itself changes nothing here: the position moves
            // when the follow-up WaypointEntered lands. The rest record
            // progress or context without moving the user.
            _ => {}
        }
    }

    view.head_event_id = Some(latest.event_id.clone());
    view.active_head_id = latest.head_id.clone();
    view
}

/// Find where a branch diverged from the rest of the DAG.
///
/// Returns the parent event of the branch's earliest event, or None for
/// "main" and for unknown or root-started branches.
#[must_use]
pub fn branch_divergence_point(events: &[EventEnvelope], head_id: &str) -> Option<String> {
    if head_id == DEFAULT_HEAD {
        return None;
    }
    events
        .iter()
        .filter(|e| e.head_id == head_id)
        .min_by_key(|e| e.seq)
        .and_then(|e| e.parent_event_id.clone())
}

/// The sequence of waypoints visited up to and including the target.
///
/// Walks `WaypointEntered` events in order and stops at the first match;
/// an unknown target yields the full visit history.
#[must_use]
pub fn path_to_waypoint(events: &[EventEnvelope], target_waypoint_id: &str) -> Vec<String> {
    let mut path = Vec::new();
    for event in events {
        if let EventPayload::WaypointEntered(payload) = &event.payload {
            path.push(payload.waypoint_id.clone());
            if payload.waypoint_id == target_waypoint_id {
                break;
            }
        }
    }
    path
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::{Actor, WaypointEnteredPayload};
    use chrono::Utc;

    fn entered(
        event_id: &str,
        seq: u64,
        head_id: &str,
        waypoint: &str,
        via: Option<EntryVia>,
    ) -> EventEnvelope {
        EventEnvelope {
            event_id: event_id.to_string(),
            session_id: "s1".to_string(),
            seq,
            ts: Utc::now(),
            parent_event_id: None,
            head_id: head_id.to_string(),
            trail_version_id: None,
            waypoint_id: Some(waypoint.to_string()),
            actor: Actor::system(),
            payload: EventPayload::WaypointEntered(WaypointEnteredPayload {
                waypoint_id: waypoint.to_string(),
                via,
                from_waypoint_id: None,
            }),
        }
    }

    #[test]
    fn empty_log_yields_defaults() {
        let view = reduce_journey(&[]);
        assert!(view.head_event_id.is_none());
        assert!(view.current_waypoint_id.is_none());
        assert_eq!(view.active_head_id, DEFAULT_HEAD);
        assert!(view.branch_tips.is_empty());
    }

    #[test]
    fn tracks_position_and_visits() {
        let events = vec![
            entered("e0", 0, "main", "w1", None),
            entered("e1", 1, "main", "w2", Some(EntryVia::Next)),
        ];
        let view = reduce_journey(&events);
        assert_eq!(view.current_waypoint_id.as_deref(), Some("w2"));
        assert_eq!(view.head_event_id.as_deref(), Some("e1"));
        assert_eq!(view.visited_waypoints.len(), 2);
        assert_eq!(view.backtrack_targets, vec!["e0", "e1"]);
    }

    #[test]
    fn backtrack_entries_are_not_backtrack_targets() {
        let events = vec![
            entered("e0", 0, "main", "w1", None),
            entered("e1", 1, "main", "w2", Some(EntryVia::Next)),
            entered("e2", 2, "main", "w1", Some(EntryVia::Backtrack)),
        ];
        let view = reduce_journey(&events);
        assert_eq!(view.backtrack_targets, vec!["e0", "e1"]);
        // ...but the visit itself is still recorded
        assert_eq!(view.visited_waypoints.len(), 3);
        assert_eq!(view.current_waypoint_id.as_deref(), Some("w1"));
    }

    #[test]
    fn branch_tips_track_every_head() {
        let mut side = entered("e1", 1, "experiment", "w2", Some(EntryVia::Jump));
        side.parent_event_id = Some("e0".to_string());
        let events = vec![
            entered("e0", 0, "main", "w1", None),
            side,
            entered("e2", 2, "main", "w3", Some(EntryVia::Next)),
        ];
        let view = reduce_journey(&events);
        assert_eq!(view.branch_tips.len(), 2);
        assert_eq!(view.branch_tips["main"].event_id, "e2");
        assert_eq!(view.branch_tips["experiment"].event_id, "e1");
        assert_eq!(view.active_head_id, "main");
    }

    #[test]
    fn divergence_point() {
        let mut side = entered("e1", 1, "experiment", "w2", Some(EntryVia::Jump));
        side.parent_event_id = Some("e0".to_string());
        let events = vec![entered("e0", 0, "main", "w1", None), side];

        assert_eq!(
            branch_divergence_point(&events, "experiment").as_deref(),
            Some("e0")
        );
        assert!(branch_divergence_point(&events, "main").is_none());
        assert!(branch_divergence_point(&events, "ghost").is_none());
    }

    #[test]
    fn path_stops_at_target() {
        let events = vec![
            entered("e0", 0, "main", "w1", None),
            entered("e1", 1, "main", "w2", None),
            entered("e2", 2, "main", "w3", None),
        ];
        assert_eq!(path_to_waypoint(&events, "w2"), vec!["w1", "w2"]);
        assert_eq!(path_to_waypoint(&events, "nope"), vec!["w1", "w2", "w3"]);
    }
}
