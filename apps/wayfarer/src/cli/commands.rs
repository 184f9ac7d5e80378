//! # CLI Command Implementations
//!
//! One function per subcommand. Commands open the store, do their work,
//! and print to stdout; errors propagate to main for a nonzero exit.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;

use wayfarer_core::store::jsonl;
use wayfarer_core::{
    reduce_session_state, EventFilter, EventStore, SessionState, WayfarerError,
};

use crate::api;

fn open_store(db: &Path) -> Result<EventStore, WayfarerError> {
    EventStore::open(db)
}

// =============================================================================
// INIT
// =============================================================================

pub fn cmd_init(db: &Path, force: bool) -> Result<(), WayfarerError> {
    if db.exists() {
        if !force {
            return Err(WayfarerError::Validation(format!(
                "database already exists: {} (use --force to overwrite)",
                db.display()
            )));
        }
        std::fs::remove_file(db)
            .map_err(|e| WayfarerError::Storage(format!("failed to remove {}: {e}", db.display())))?;
    }

    open_store(db)?;
    println!("Initialized event database at {}", db.display());
    Ok(())
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

pub fn cmd_import(
    db: &Path,
    input: &Path,
    session_id: Option<&str>,
) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    let count = jsonl::import_session(&store, input, session_id)?;
    println!("Imported {count} events from {}", input.display());
    Ok(())
}

pub fn cmd_export(db: &Path, session_id: &str, output: &Path) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    if !store.session_exists(session_id)? {
        return Err(WayfarerError::NotFound(format!(
            "session not found: {session_id}"
        )));
    }
    let count = jsonl::export_session(&store, session_id, output)?;
    println!("Exported {count} events to {}", output.display());
    Ok(())
}

// =============================================================================
// STATE
// =============================================================================

pub fn cmd_state(db: &Path, session_id: &str, json: bool) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    if !store.session_exists(session_id)? {
        return Err(WayfarerError::NotFound(format!(
            "session not found: {session_id}"
        )));
    }

    let events = store.get_events(session_id, &EventFilter::default())?;
    let state = reduce_session_state(session_id, &events);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state)
                .map_err(|e| WayfarerError::Serialization(e.to_string()))?
        );
    } else {
        print_state_summary(&state);
    }
    Ok(())
}

fn print_state_summary(state: &SessionState) {
    println!("Session: {}", state.session_id);
    println!(
        "  {} events, last seq {}",
        state.event_count, state.last_event_seq
    );

    println!("Journey:");
    println!(
        "  current waypoint: {}",
        state
            .journey
            .current_waypoint_id
            .as_deref()
            .unwrap_or("(none)")
    );
    println!("  active branch:    {}", state.journey.active_head_id);
    println!(
        "  visited:          {} waypoints",
        state.journey.visited_waypoints.len()
    );
    if state.journey.branch_tips.len() > 1 {
        println!("  branches:");
        for (head_id, tip) in &state.journey.branch_tips {
            println!("    {head_id} @ seq {}", tip.seq);
        }
    }

    println!("Learned:");
    for (label, records) in [
        ("preferences", &state.learned.preferences),
        ("constraints", &state.learned.constraints),
        ("concepts", &state.learned.concepts),
    ] {
        if records.is_empty() {
            continue;
        }
        println!("  {label}:");
        for (id, record) in records {
            println!("    {id}: confidence {:.2}", record.confidence);
        }
    }

    println!("Artifacts:");
    let active = state.artifacts.active_artifacts();
    let superseded = state.artifacts.superseded_artifacts();
    println!(
        "  {} active, {} superseded",
        active.len(),
        superseded.len()
    );
    for (artifact_id, record) in active {
        println!("    {artifact_id}: {}", record.content_ref);
    }
}

// =============================================================================
// EVENTS / SESSIONS
// =============================================================================

pub fn cmd_events(
    db: &Path,
    session_id: &str,
    head: Option<&str>,
    from_seq: Option<u64>,
    to_seq: Option<u64>,
    json: bool,
) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    if !store.session_exists(session_id)? {
        return Err(WayfarerError::NotFound(format!(
            "session not found: {session_id}"
        )));
    }

    let filter = EventFilter {
        head_id: head.map(str::to_string),
        from_seq,
        to_seq,
        event_type: None,
    };
    let events = store.get_events(session_id, &filter)?;

    if json {
        for event in &events {
            println!(
                "{}",
                serde_json::to_string(event)
                    .map_err(|e| WayfarerError::Serialization(e.to_string()))?
            );
        }
    } else {
        for event in &events {
            println!(
                "[{:04}] {} ({})",
                event.seq,
                event.event_type(),
                event.head_id
            );
        }
        println!("{} events", events.len());
    }
    Ok(())
}

pub fn cmd_sessions(db: &Path, json: bool) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    let sessions = store.list_sessions()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&sessions)
                .map_err(|e| WayfarerError::Serialization(e.to_string()))?
        );
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for session_id in &sessions {
        let tip = store.latest_seq(session_id)?;
        match tip {
            Some(seq) => println!("{session_id}  ({} events)", seq + 1),
            None => println!("{session_id}  (empty)"),
        }
    }
    Ok(())
}

// =============================================================================
// SERVE
// =============================================================================

pub async fn cmd_serve(db: &Path, host: &str, port: u16) -> Result<(), WayfarerError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| WayfarerError::Validation(format!("invalid bind address: {e}")))?;
    let store = open_store(db)?;
    api::run_server(addr, store).await
}

// =============================================================================
// DOCTOR
// =============================================================================

/// Integrity check over the whole database.
///
/// Issues make the database unhealthy (nonzero exit); warnings do not:
/// - duplicate or unordered seqs: issue
/// - dangling `parent_event_id`: issue
/// - envelope that fails validation: issue
/// - gaps in the seq sequence: warning (valid, but unusual)
///
/// Every session is also replayed through the reducers to confirm the
/// derived state can be rebuilt.
pub fn cmd_doctor(db: &Path) -> Result<(), WayfarerError> {
    let store = open_store(db)?;
    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let sessions = store.list_sessions()?;
    println!("Checking {} sessions in {}", sessions.len(), db.display());

    for session_id in &sessions {
        let events = store.get_events(session_id, &EventFilter::default())?;

        let mut seen = BTreeSet::new();
        let mut prev: Option<u64> = None;
        for event in &events {
            if !seen.insert(event.seq) {
                issues.push(format!("{session_id}: duplicate seq {}", event.seq));
            }
            if let Some(p) = prev
                && event.seq < p
            {
                issues.push(format!(
                    "{session_id}: seq {} out of order after {p}",
                    event.seq
                ));
            }
            prev = Some(event.seq);

            if let Some(parent_id) = &event.parent_event_id
                && store.get_event(parent_id)?.is_none()
            {
                issues.push(format!(
                    "{session_id}: event {} has dangling parent {parent_id}",
                    event.event_id
                ));
            }

            if let Err(e) = event.validate() {
                issues.push(format!("{session_id}: event {} invalid: {e}", event.event_id));
            }
        }

        for (expected, event) in events.iter().enumerate() {
            if event.seq != expected as u64 {
                warnings.push(format!(
                    "{session_id}: seq gap before {} (expected {expected})",
                    event.seq
                ));
                break;
            }
        }

        let state = reduce_session_state(session_id, &events);
        println!(
            "  {session_id}: {} events, head {}, waypoint {}",
            state.event_count,
            state.journey.active_head_id,
            state.journey.current_waypoint_id.as_deref().unwrap_or("-")
        );
    }

    for warning in &warnings {
        println!("WARN  {warning}");
    }
    for issue in &issues {
        println!("ISSUE {issue}");
    }

    if issues.is_empty() {
        println!("HEALTHY ({} warnings)", warnings.len());
        Ok(())
    } else {
        println!("UNHEALTHY ({} issues)", issues.len());
        Err(WayfarerError::Validation(format!(
            "{} integrity issues found",
            issues.len()
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================
