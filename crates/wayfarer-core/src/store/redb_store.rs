//! # redb-backed Event Store
//!
//! An append-only event log on the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! ## Atomicity
//!
//! The whole of `append` — duplicate event_id check, next-seq computation,
//! (session, seq) collision check, all index inserts — runs inside one redb
//! write transaction. redb admits a single write transaction at a time, so
//! that transaction is the critical section for seq assignment; no extra
//! lock is layered on top. A failed append commits nothing. Readers use
//! snapshot read transactions and never observe partial writes.

use crate::model::{EventEnvelope, EventType, WayfarerError, DEFAULT_HEAD};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeSet;
use std::path::Path;

/// Primary records: event_id -> envelope JSON bytes.
const EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("events");

/// Unique total order per session: (session_id, seq) -> event_id.
const SESSION_SEQ: TableDefinition<(&str, u64), &str> = TableDefinition::new("session_seq");

/// Branch index: (session_id, head_id, seq) -> event_id.
const HEAD_INDEX: TableDefinition<(&str, &str, u64), &str> = TableDefinition::new("head_index");

/// Causal index: (parent_event_id, seq) -> event_id.
/// seq in the key keeps children ordered and allows sibling fan-out.
const PARENT_INDEX: TableDefinition<(&str, u64), &str> = TableDefinition::new("parent_index");

/// Type index: (session_id, event_type, seq) -> event_id.
const TYPE_INDEX: TableDefinition<(&str, &str, u64), &str> = TableDefinition::new("type_index");

/// Session tips: session_id -> highest seq observed.
const SESSIONS: TableDefinition<&str, u64> = TableDefinition::new("sessions");

/// Filters for [`EventStore::get_events`].
///
/// All fields are optional and combine with AND. `from_seq`/`to_seq` are
/// both inclusive.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub head_id: Option<String>,
    pub from_seq: Option<u64>,
    pub to_seq: Option<u64>,
    pub event_type: Option<EventType>,
}

/// Append-only event store backed by redb.
///
/// Methods take `&self`: the database handle is internally synchronized, so
/// one store can be shared across threads behind an `Arc` without a lock.
pub struct EventStore {
    db: Database,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").finish_non_exhaustive()
    }
}

impl EventStore {
    /// Open or create an event store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WayfarerError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(EVENTS)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(SESSION_SEQ)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(HEAD_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(PARENT_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(TYPE_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(SESSIONS)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Append an event to the log.
    ///
    /// With `auto_seq` the event's own `seq` is ignored and the next seq for
    /// its session is assigned atomically (0 for a new session). Without it
    /// the event's explicit `seq` is used.
    ///
    /// Returns the event as persisted (seq populated).
    ///
    /// # Errors
    ///
    /// - `Validation` if the envelope fails [`EventEnvelope::validate`].
    /// - `Conflict` if the event_id already exists or the (session, seq)
    ///   slot is taken. Nothing is persisted in either case.
    pub fn append(
        &self,
        event: &EventEnvelope,
        auto_seq: bool,
    ) -> Result<EventEnvelope, WayfarerError> {
        event.validate()?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        let stored = {
            let mut events_table = write_txn
                .open_table(EVENTS)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let mut seq_table = write_txn
                .open_table(SESSION_SEQ)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let mut head_table = write_txn
                .open_table(HEAD_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let mut parent_table = write_txn
                .open_table(PARENT_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let mut type_table = write_txn
                .open_table(TYPE_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let mut sessions_table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;

            if events_table
                .get(event.event_id.as_str())
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
                .is_some()
            {
                return Err(WayfarerError::Conflict(format!(
                    "event {} already exists",
                    event.event_id
                )));
            }

            let tip = sessions_table
                .get(event.session_id.as_str())
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
                .map(|v| v.value());

            let seq = if auto_seq {
                tip.map_or(0, |t| t.saturating_add(1))
            } else {
                event.seq
            };

            if seq_table
                .get((event.session_id.as_str(), seq))
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
                .is_some()
            {
                return Err(WayfarerError::Conflict(format!(
                    "seq {seq} already taken in session {}",
                    event.session_id
                )));
            }

            let mut stored = event.clone();
            stored.seq = seq;

            let bytes = serde_json::to_vec(&stored)
                .map_err(|e| WayfarerError::Serialization(e.to_string()))?;

            events_table
                .insert(stored.event_id.as_str(), bytes.as_slice())
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            seq_table
                .insert((stored.session_id.as_str(), seq), stored.event_id.as_str())
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            head_table
                .insert(
                    (stored.session_id.as_str(), stored.head_id.as_str(), seq),
                    stored.event_id.as_str(),
                )
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            type_table
                .insert(
                    (
                        stored.session_id.as_str(),
                        stored.event_type().as_str(),
                        seq,
                    ),
                    stored.event_id.as_str(),
                )
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            if let Some(parent) = &stored.parent_event_id {
                parent_table
                    .insert((parent.as_str(), seq), stored.event_id.as_str())
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            }

            let new_tip = tip.map_or(seq, |t| t.max(seq));
            sessions_table
                .insert(stored.session_id.as_str(), new_tip)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;

            stored
        };

        write_txn
            .commit()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        Ok(stored)
    }

    /// Get events for a session, ascending by seq.
    ///
    /// Filters combine with AND; seq bounds are inclusive on both ends.
    pub fn get_events(
        &self,
        session_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<EventEnvelope>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let events_table = read_txn
            .open_table(EVENTS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        let lo = filter.from_seq.unwrap_or(0);
        let hi = filter.to_seq.unwrap_or(u64::MAX);

        // Pick the most selective index: the seq bounds fold into the range
        // key, leaving at most one residual filter.
        let mut event_ids = Vec::new();
        if let Some(head_id) = &filter.head_id {
            let head_table = read_txn
                .open_table(HEAD_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            for entry in head_table
                .range((session_id, head_id.as_str(), lo)..=(session_id, head_id.as_str(), hi))
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
            {
                let (_, value) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
                event_ids.push(value.value().to_string());
            }
        } else if let Some(event_type) = filter.event_type {
            let type_table = read_txn
                .open_table(TYPE_INDEX)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            for entry in type_table
                .range((session_id, event_type.as_str(), lo)..=(session_id, event_type.as_str(), hi))
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
            {
                let (_, value) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
                event_ids.push(value.value().to_string());
            }
        } else {
            let seq_table = read_txn
                .open_table(SESSION_SEQ)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;
            for entry in seq_table
                .range((session_id, lo)..=(session_id, hi))
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
            {
                let (_, value) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
                event_ids.push(value.value().to_string());
            }
        }

        let mut events = Vec::with_capacity(event_ids.len());
        for event_id in &event_ids {
            let Some(bytes) = events_table
                .get(event_id.as_str())
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
            else {
                // Index without a primary record means on-disk corruption.
                return Err(WayfarerError::Storage(format!(
                    "index points at missing event {event_id}"
                )));
            };
            let event: EventEnvelope = serde_json::from_slice(bytes.value())
                .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
            events.push(event);
        }

        // Residual type filter when the head index drove the scan.
        if filter.head_id.is_some()
            && let Some(event_type) = filter.event_type
        {
            events.retain(|e| e.event_type() == event_type);
        }

        Ok(events)
    }

    /// Get a single event by id.
    pub fn get_event(&self, event_id: &str) -> Result<Option<EventEnvelope>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let events_table = read_txn
            .open_table(EVENTS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        match events_table
            .get(event_id)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let event: EventEnvelope = serde_json::from_slice(bytes.value())
                    .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// Get all events whose parent is the given event, ascending by seq.
    pub fn get_children(
        &self,
        parent_event_id: &str,
    ) -> Result<Vec<EventEnvelope>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let parent_table = read_txn
            .open_table(PARENT_INDEX)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let events_table = read_txn
            .open_table(EVENTS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        let mut children = Vec::new();
        for entry in parent_table
            .range((parent_event_id, 0u64)..=(parent_event_id, u64::MAX))
            .map_err(|e| WayfarerError::Storage(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
            let event_id = value.value();
            let Some(bytes) = events_table
                .get(event_id)
                .map_err(|e| WayfarerError::Storage(e.to_string()))?
            else {
                return Err(WayfarerError::Storage(format!(
                    "index points at missing event {event_id}"
                )));
            };
            let event: EventEnvelope = serde_json::from_slice(bytes.value())
                .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
            children.push(event);
        }
        Ok(children)
    }

    /// All distinct head_ids in a session, sorted.
    pub fn get_all_heads(&self, session_id: &str) -> Result<BTreeSet<String>, WayfarerError> {
        let mut heads = BTreeSet::new();
        for event in self.get_events(session_id, &EventFilter::default())? {
            heads.insert(event.head_id);
        }
        Ok(heads)
    }

    /// The latest event on a specific head, or None if the head is empty.
    ///
    /// Reads only the last head-index entry and one event record, so the
    /// cost does not grow with the branch length.
    pub fn get_head_tip(
        &self,
        session_id: &str,
        head_id: &str,
    ) -> Result<Option<EventEnvelope>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let head_table = read_txn
            .open_table(HEAD_INDEX)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        let mut range = head_table
            .range((session_id, head_id, 0u64)..=(session_id, head_id, u64::MAX))
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let Some(entry) = range.next_back() else {
            return Ok(None);
        };
        let (_, value) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let event_id = value.value().to_string();

        let events_table = read_txn
            .open_table(EVENTS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let Some(bytes) = events_table
            .get(event_id.as_str())
            .map_err(|e| WayfarerError::Storage(e.to_string()))?
        else {
            return Err(WayfarerError::Storage(format!(
                "index points at missing event {event_id}"
            )));
        };
        let event: EventEnvelope = serde_json::from_slice(bytes.value())
            .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
        Ok(Some(event))
    }

    /// The head_id of the latest event by seq, or "main" for an empty session.
    pub fn get_active_head(&self, session_id: &str) -> Result<String, WayfarerError> {
        match self.latest_seq(session_id)? {
            Some(tip) => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?;
                let seq_table = read_txn
                    .open_table(SESSION_SEQ)
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?;
                let events_table = read_txn
                    .open_table(EVENTS)
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?;

                let Some(event_id) = seq_table
                    .get((session_id, tip))
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?
                    .map(|v| v.value().to_string())
                else {
                    return Err(WayfarerError::Storage(format!(
                        "session {session_id} tip {tip} has no event"
                    )));
                };
                let Some(bytes) = events_table
                    .get(event_id.as_str())
                    .map_err(|e| WayfarerError::Storage(e.to_string()))?
                else {
                    return Err(WayfarerError::Storage(format!(
                        "index points at missing event {event_id}"
                    )));
                };
                let event: EventEnvelope = serde_json::from_slice(bytes.value())
                    .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
                Ok(event.head_id)
            }
            None => Ok(DEFAULT_HEAD.to_string()),
        }
    }

    /// The highest seq in a session, or None for an empty session.
    pub fn latest_seq(&self, session_id: &str) -> Result<Option<u64>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let sessions_table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        Ok(sessions_table
            .get(session_id)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?
            .map(|v| v.value()))
    }

    /// The seq the next auto-assigned event would get.
    pub fn next_seq(&self, session_id: &str) -> Result<u64, WayfarerError> {
        Ok(self
            .latest_seq(session_id)?
            .map_or(0, |t| t.saturating_add(1)))
    }

    /// True if the session has at least one event.
    pub fn session_exists(&self, session_id: &str) -> Result<bool, WayfarerError> {
        Ok(self.latest_seq(session_id)?.is_some())
    }

    /// All session ids in the store, sorted.
    pub fn list_sessions(&self) -> Result<Vec<String>, WayfarerError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let sessions_table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| WayfarerError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for entry in sessions_table
            .iter()
            .map_err(|e| WayfarerError::Storage(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| WayfarerError::Storage(e.to_string()))?;
            sessions.push(key.value().to_string());
        }
        Ok(sessions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::{
        Actor, EventPayload, IntentCreatedPayload, WaypointEnteredPayload,
    };
    use chrono::Utc;
    use tempfile::tempdir;

    fn intent(event_id: &str, session_id: &str, seq: u64) -> EventEnvelope {
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
            payload: EventPayload::IntentCreated(IntentCreatedPayload {
                goal: "learn rust".to_string(),
                motivation: None,
                starting_point: None,
                constraints: None,
                comfort_level: None,
            }),
        }
    }

    fn entered(event_id: &str, session_id: &str, seq: u64, waypoint: &str) -> EventEnvelope {
        let mut event = intent(event_id, session_id, seq);
        event.payload = EventPayload::WaypointEntered(WaypointEnteredPayload {
            waypoint_id: waypoint.to_string(),
            via: None,
            from_waypoint_id: None,
        });
        event
    }

    #[test]
    fn append_auto_seq_starts_at_zero() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        let first = store.append(&intent("e1", "s1", 99), true).expect("append");
        assert_eq!(first.seq, 0);
        let second = store.append(&intent("e2", "s1", 99), true).expect("append");
        assert_eq!(second.seq, 1);

        // Independent sessions get independent counters
        let other = store.append(&intent("e3", "s2", 99), true).expect("append");
        assert_eq!(other.seq, 0);
    }

    #[test]
    fn duplicate_event_id_conflicts() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        store.append(&intent("e1", "s1", 0), false).expect("append");
        let err = store
            .append(&intent("e1", "s1", 1), false)
            .expect_err("duplicate id");
        assert!(err.is_conflict());
    }

    #[test]
    fn duplicate_seq_conflicts_and_commits_nothing() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        store.append(&intent("e1", "s1", 0), false).expect("append");
        let err = store
            .append(&intent("e2", "s1", 0), false)
            .expect_err("seq taken");
        assert!(err.is_conflict());

        // The losing event left no trace anywhere
        assert!(store.get_event("e2").expect("get").is_none());
        let events = store
            .get_events("s1", &EventFilter::default())
            .expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(store.next_seq("s1").expect("next"), 1);
    }

    #[test]
    fn explicit_out_of_order_appends_read_back_ascending() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        for (id, seq) in [("e5", 5), ("e2", 2), ("e9", 9)] {
            store.append(&intent(id, "s1", seq), false).expect("append");
        }

        let events = store
            .get_events("s1", &EventFilter::default())
            .expect("events");
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![2, 5, 9]);

        // Tip tracks MAX(seq), not insertion order
        assert_eq!(store.latest_seq("s1").expect("latest"), Some(9));
        assert_eq!(store.next_seq("s1").expect("next"), 10);
    }

    #[test]
    fn seq_range_bounds_are_inclusive() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        for seq in 0..5 {
            store
                .append(&intent(&format!("e{seq}"), "s1", seq), false)
                .expect("append");
        }

        let filter = EventFilter {
            from_seq: Some(1),
            to_seq: Some(3),
            ..EventFilter::default()
        };
        let events = store.get_events("s1", &filter).expect("events");
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn head_and_type_filters() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        store.append(&intent("e0", "s1", 0), false).expect("append");
        let mut on_branch = entered("e1", "s1", 1, "w1");
        on_branch.head_id = "experiment".to_string();
        store.append(&on_branch, false).expect("append");
        store
            .append(&entered("e2", "s1", 2, "w2"), false)
            .expect("append");

        let by_head = store
            .get_events(
                "s1",
                &EventFilter {
                    head_id: Some("experiment".to_string()),
                    ..EventFilter::default()
                },
            )
            .expect("events");
        assert_eq!(by_head.len(), 1);
        assert_eq!(by_head[0].event_id, "e1");

        let by_type = store
            .get_events(
                "s1",
                &EventFilter {
                    event_type: Some(EventType::WaypointEntered),
                    ..EventFilter::default()
                },
            )
            .expect("events");
        assert_eq!(by_type.len(), 2);

        // Head + type combined
        let both = store
            .get_events(
                "s1",
                &EventFilter {
                    head_id: Some(DEFAULT_HEAD.to_string()),
                    event_type: Some(EventType::WaypointEntered),
                    ..EventFilter::default()
                },
            )
            .expect("events");
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].event_id, "e2");
    }

    #[test]
    fn children_ordered_by_seq() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        store.append(&intent("root", "s1", 0), false).expect("append");
        for (id, seq) in [("c2", 2), ("c1", 1)] {
            let mut child = entered(id, "s1", seq, "w");
            child.parent_event_id = Some("root".to_string());
            store.append(&child, false).expect("append");
        }

        let children = store.get_children("root").expect("children");
        let ids: Vec<&str> = children.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(store.get_children("missing").expect("children").is_empty());
    }

    #[test]
    fn heads_and_tips() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        assert_eq!(store.get_active_head("s1").expect("active"), DEFAULT_HEAD);
        assert!(store.get_head_tip("s1", "main").expect("tip").is_none());

        store.append(&intent("e0", "s1", 0), false).expect("append");
        let mut branched = entered("e1", "s1", 1, "w1");
        branched.head_id = "experiment".to_string();
        store.append(&branched, false).expect("append");

        let heads = store.get_all_heads("s1").expect("heads");
        assert_eq!(
            heads.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["experiment", "main"]
        );

        let tip = store.get_head_tip("s1", "main").expect("tip").expect("some");
        assert_eq!(tip.event_id, "e0");
        assert_eq!(store.get_active_head("s1").expect("active"), "experiment");
    }

    #[test]
    fn head_tip_is_highest_seq_on_that_branch() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        // Interleave two branches so each branch's tip is not the session tip
        for (event_id, seq, head) in [
            ("e0", 0, "main"),
            ("e1", 1, "experiment"),
            ("e2", 2, "main"),
            ("e3", 3, "experiment"),
            ("e4", 4, "main"),
        ] {
            let mut event = entered(event_id, "s1", seq, "w1");
            event.head_id = head.to_string();
            store.append(&event, false).expect("append");
        }

        let main_tip = store.get_head_tip("s1", "main").expect("tip").expect("some");
        assert_eq!(main_tip.event_id, "e4");
        assert_eq!(main_tip.seq, 4);

        let branch_tip = store
            .get_head_tip("s1", "experiment")
            .expect("tip")
            .expect("some");
        assert_eq!(branch_tip.event_id, "e3");
        assert_eq!(branch_tip.seq, 3);

        // A session prefix shared with another session id must not leak in
        assert!(store.get_head_tip("s", "main").expect("tip").is_none());
        assert!(store.get_head_tip("s1", "exp").expect("tip").is_none());
    }

    #[test]
    fn sessions_listing_and_existence() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        assert!(!store.session_exists("s1").expect("exists"));
        store.append(&intent("e1", "s1", 0), false).expect("append");
        store.append(&intent("e2", "s2", 0), false).expect("append");

        assert!(store.session_exists("s1").expect("exists"));
        assert_eq!(store.list_sessions().expect("list"), vec!["s1", "s2"]);
    }

    #[test]
    fn persistence_across_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let store = EventStore::open(&db_path).expect("open");
            store.append(&intent("e1", "s1", 99), true).expect("append");
        }

        {
            let store = EventStore::open(&db_path).expect("reopen");
            let event = store.get_event("e1").expect("get").expect("some");
            assert_eq!(event.seq, 0);
            assert_eq!(store.next_seq("s1").expect("next"), 1);
        }
    }

    #[test]
    fn invalid_event_never_persisted() {
        let temp = tempdir().expect("temp dir");
        let store = EventStore::open(temp.path().join("test.redb")).expect("open");

        let mut bad = intent("e1", "s1", 0);
        bad.head_id.clear();
        assert!(matches!(
            store.append(&bad, false),
            Err(WayfarerError::Validation(_))
        ));
        assert!(store.get_event("e1").expect("get").is_none());
        assert!(!store.session_exists("s1").expect("exists"));
    }
}
