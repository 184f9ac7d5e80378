//! # Reducers
//!
//! Pure folds from an ordered event slice to derived views. No I/O, no
//! clocks, no randomness: the same events produce bit-identical views,
//! which is what makes replay a valid integrity check.
//!
//! - Journey = where you ARE (branch-aware navigation state)
//! - Learned = what you KNOW (global, survives backtracking)
//! - Artifacts = what you MADE (global, with supersedence history)
//!
//! Reducers never error on log contents: dangling parents, unknown
//! supersede targets, and missing evidence are tolerated, not rejected.

mod artifacts;
mod journey;
mod learned;
mod session;

pub use artifacts::{artifact_chain, reduce_artifacts};
pub use journey::{branch_divergence_point, path_to_waypoint, reduce_journey};
pub use learned::{clamp, high_confidence_concepts, reduce_learned};
pub use session::reduce_session_state;
