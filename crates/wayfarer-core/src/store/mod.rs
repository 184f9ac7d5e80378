//! Persistence for the event log: the redb-backed store and the JSONL
//! interchange format.

pub mod jsonl;
mod redb_store;

pub use redb_store::{EventFilter, EventStore};
