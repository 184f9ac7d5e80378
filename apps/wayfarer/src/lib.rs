//! # Wayfarer - Learning Journey Server
//!
//! The main binary crate for the Wayfarer event log.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for log operations
//!
//! Both surfaces sit on `wayfarer-core`: the CLI and the API are thin
//! adapters over the same append/reduce operations.

pub mod api;
pub mod cli;
