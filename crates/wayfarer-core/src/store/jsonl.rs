//! JSONL import/export for event logs.
//!
//! One JSON object per line, ordered by seq. Used for debugging, sharing
//! repros, and moving sessions between stores. Round-trips are lossless:
//! export-import-export produces byte-identical lines.

use crate::model::{EventEnvelope, WayfarerError};
use crate::store::{EventFilter, EventStore};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Export a session to a JSONL file, one event per line, ascending by seq.
///
/// Creates parent directories as needed. Returns the number of events
/// written.
pub fn export_session(
    store: &EventStore,
    session_id: &str,
    output_path: impl AsRef<Path>,
) -> Result<usize, WayfarerError> {
    let events = store.get_events(session_id, &EventFilter::default())?;

    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| WayfarerError::Storage(e.to_string()))?;
    }

    let file = File::create(output_path).map_err(|e| WayfarerError::Storage(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    for event in &events {
        let line = serde_json::to_string(event)
            .map_err(|e| WayfarerError::Serialization(e.to_string()))?;
        writeln!(writer, "{line}").map_err(|e| WayfarerError::Storage(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| WayfarerError::Storage(e.to_string()))?;

    Ok(events.len())
}

/// Import events from a JSONL file into the store.
///
/// Events keep their explicit seq from the file. Blank lines are skipped.
/// With `session_id_override` every imported event is rewritten to that
/// session. Returns the number of events imported.
///
/// # Errors
///
/// `Validation` with the 1-based line number for malformed JSON or invalid
/// events; `Conflict` if an event collides with the store's contents.
/// Events appended before the failing line stay appended.
pub fn import_session(
    store: &EventStore,
    input_path: impl AsRef<Path>,
    session_id_override: Option<&str>,
) -> Result<usize, WayfarerError> {
    let file = File::open(input_path.as_ref())
        .map_err(|e| WayfarerError::Storage(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut count = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.map_err(|e| WayfarerError::Storage(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut event: EventEnvelope = serde_json::from_str(line).map_err(|e| {
            WayfarerError::Validation(format!("invalid event on line {line_num}: {e}"))
        })?;

        if let Some(session_id) = session_id_override {
            event.session_id = session_id.to_string();
        }

        store.append(&event, false).map_err(|e| match e {
            WayfarerError::Validation(msg) => {
                WayfarerError::Validation(format!("invalid event on line {line_num}: {msg}"))
            }
            other => other,
        })?;
        count += 1;
    }

    Ok(count)
}
