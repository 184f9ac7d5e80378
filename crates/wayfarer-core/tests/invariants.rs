//! # Log Invariants
//!
//! End-to-end invariants across the store and reducers: atomic seq
//! assignment under contention, conflict isolation, and derived-state
//! behavior over a realistic session log.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use wayfarer_core::model::{
    ArtifactCreatedPayload, ArtifactSupersededPayload, ConceptLearnedPayload,
    IntentCreatedPayload, WaypointEnteredPayload,
};
use wayfarer_core::{
    reduce_session_state, Actor, ArtifactKind, ArtifactSpec, EntryVia, EventEnvelope, EventFilter,
    EventPayload, EventStore, SideEffects, DEFAULT_HEAD,
};

fn envelope(event_id: &str, session_id: &str, seq: u64, payload: EventPayload) -> EventEnvelope {
    EventEnvelope {
        event_id: event_id.to_string(),
        session_id: session_id.to_string(),
        seq,
        ts: Utc::now(),
        parent_event_id: None,
        head_id: DEFAULT_HEAD.to_string(),
        trail_version_id: None,
        waypoint_id: None,
        actor: Actor::system(),
        payload,
    }
}

fn intent(event_id: &str, session_id: &str) -> EventEnvelope {
    envelope(
        event_id,
        session_id,
        0,
        EventPayload::IntentCreated(IntentCreatedPayload {
            goal: "ship a web app".to_string(),
            motivation: None,
            starting_point: None,
            constraints: None,
            comfort_level: None,
        }),
    )
}

fn entered(event_id: &str, seq: u64, waypoint: &str, via: Option<EntryVia>) -> EventEnvelope {
    envelope(
        event_id,
        "s1",
        seq,
        EventPayload::WaypointEntered(WaypointEnteredPayload {
            waypoint_id: waypoint.to_string(),
            via,
            from_waypoint_id: None,
        }),
    )
}

fn concept(event_id: &str, seq: u64, head: &str, delta: f64) -> EventEnvelope {
    let mut event = envelope(
        event_id,
        "s1",
        seq,
        EventPayload::ConceptLearned(ConceptLearnedPayload {
            concept_id: "concept.functions".to_string(),
            confidence_delta: delta,
            evidence: None,
            note: None,
        }),
    );
    event.head_id = head.to_string();
    event
}

// =============================================================================
// CONCURRENCY
// =============================================================================

/// N racing writers with auto_seq end up with exactly {0..N-1}: no gaps, no
/// duplicates, no lost writes.
#[test]
fn concurrent_auto_seq_is_gapless() {
    const WRITERS: usize = 64;

    let temp = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(EventStore::open(temp.path().join("race.redb")).expect("open"));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let event = intent(&format!("e{i}"), "s1");
                store.append(&event, true).expect("append").seq
            })
        })
        .collect();

    let mut assigned = BTreeSet::new();
    for handle in handles {
        assert!(assigned.insert(handle.join().expect("thread")));
    }

    let expected: BTreeSet<u64> = (0..WRITERS as u64).collect();
    assert_eq!(assigned, expected);

    let events = store
        .get_events("s1", &EventFilter::default())
        .expect("events");
    assert_eq!(events.len(), WRITERS);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.seq, i as u64);
    }
}

/// A losing writer's conflict leaves the visible state exactly as it was.
#[test]
fn conflict_leaves_state_unchanged() {
    let temp = tempfile::tempdir().expect("temp dir");
    let store = EventStore::open(temp.path().join("conflict.redb")).expect("open");

    store.append(&intent("e1", "s1"), false).expect("append");
    let before = store
        .get_events("s1", &EventFilter::default())
        .expect("events");

    let mut loser = entered("e2", 0, "w1", None);
    loser.seq = 0;
    assert!(store.append(&loser, false).expect_err("conflict").is_conflict());

    let after = store
        .get_events("s1", &EventFilter::default())
        .expect("events");
    assert_eq!(before, after);
    assert_eq!(store.next_seq("s1").expect("next"), 1);
}

// =============================================================================
// DERIVED STATE OVER A REAL LOG
// =============================================================================

/// A full session: intent, navigation, a side branch with learning, a
/// backtrack, artifact supersedence. Checks the composed state end to end.
#[test]
fn session_state_over_a_branching_log() {
    let temp = tempfile::tempdir().expect("temp dir");
    let store = EventStore::open(temp.path().join("journey.redb")).expect("open");

    store.append(&intent("e0", "s1"), true).expect("append");
    store
        .append(&entered("e1", 0, "setup", None), true)
        .expect("append");

    // Learn something on a side branch, then abandon it
    store
        .append(&concept("e2", 0, "experiment", 0.3), true)
        .expect("append");
    store
        .append(&concept("e3", 0, DEFAULT_HEAD, 0.4), true)
        .expect("append");

    // Backtrack entry: visited but not a future backtrack target
    store
        .append(
            &entered("e4", 0, "setup", Some(EntryVia::Backtrack)),
            true,
        )
        .expect("append");

    // Artifact created then superseded
    let artifact = |event_id: &str, artifact_id: &str| {
        envelope(
            event_id,
            "s1",
            0,
            EventPayload::ArtifactCreated(ArtifactCreatedPayload {
                artifact: ArtifactSpec {
                    artifact_id: artifact_id.to_string(),
                    kind: ArtifactKind::Code,
                    title: None,
                    content_ref: format!("file://{artifact_id}"),
                    produced_at_waypoint_id: None,
                    reversible: true,
                    side_effects: SideEffects::None,
                },
            }),
        )
    };
    store.append(&artifact("e5", "draft"), true).expect("append");
    store.append(&artifact("e6", "final"), true).expect("append");
    store
        .append(
            &envelope(
                "e7",
                "s1",
                0,
                EventPayload::ArtifactSuperseded(ArtifactSupersededPayload {
                    artifact_id: "draft".to_string(),
                    superseded_by_artifact_id: "final".to_string(),
                    reason: Some("reviewed".to_string()),
                }),
            ),
            true,
        )
        .expect("append");

    let events = store
        .get_events("s1", &EventFilter::default())
        .expect("events");
    let state = reduce_session_state("s1", &events);

    assert_eq!(state.event_count, 8);
    assert_eq!(state.last_event_seq, 7);

    // Journey: backtrack entry moved the position but is not a target
    assert_eq!(state.journey.current_waypoint_id.as_deref(), Some("setup"));
    assert_eq!(state.journey.backtrack_targets, vec!["e1"]);
    assert_eq!(state.journey.visited_waypoints.len(), 2);
    assert_eq!(state.journey.branch_tips.len(), 2);

    // Learned: branch-agnostic sum 0.3 + 0.4
    let record = &state.learned.concepts["concept.functions"];
    assert!((record.confidence - 0.7).abs() < 1e-9);

    // Artifacts: supersedence recorded, nothing deleted
    assert_eq!(state.artifacts.artifacts.len(), 2);
    assert!(!state.artifacts.artifacts["draft"].is_active);
    assert!(state.artifacts.artifacts["final"].is_active);
}

/// Exporting, importing into a fresh store, and reducing again yields
/// bit-identical derived state.
#[test]
fn jsonl_round_trip_preserves_derived_state() {
    let temp = tempfile::tempdir().expect("temp dir");
    let source = EventStore::open(temp.path().join("src.redb")).expect("open");

    source.append(&intent("e0", "s1"), true).expect("append");
    source
        .append(&entered("e1", 0, "w1", None), true)
        .expect("append");
    source
        .append(&concept("e2", 0, DEFAULT_HEAD, 0.5), true)
        .expect("append");

    let path = temp.path().join("s1.jsonl");
    wayfarer_core::store::jsonl::export_session(&source, "s1", &path).expect("export");

    let target = EventStore::open(temp.path().join("dst.redb")).expect("open");
    wayfarer_core::store::jsonl::import_session(&target, &path, None).expect("import");

    let original = reduce_session_state(
        "s1",
        &source
            .get_events("s1", &EventFilter::default())
            .expect("events"),
    );
    let restored = reduce_session_state(
        "s1",
        &target
            .get_events("s1", &EventFilter::default())
            .expect("events"),
    );

    let a = serde_json::to_string(&original).expect("serialize");
    let b = serde_json::to_string(&restored).expect("serialize");
    assert_eq!(a, b);
}
