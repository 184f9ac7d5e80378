//! # API Request/Response Types
//!
//! Wire types for the HTTP API. The envelope payload reuses the tagged
//! union from the core crate, so the API accepts exactly the shapes the
//! log stores.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::{
    Actor, ActorKind, EventEnvelope, EventPayload, EventType, WayfarerError, DEFAULT_HEAD,
};

fn default_head_id() -> String {
    DEFAULT_HEAD.to_string()
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request body for `POST /events`.
///
/// `event_id`, `seq`, `ts`, and `actor` are optional; the server generates
/// a UUIDv7 id, assigns the next seq atomically, stamps the current time,
/// and defaults the actor to `system`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub event_id: Option<String>,
    pub session_id: String,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,

    #[serde(default)]
    pub parent_event_id: Option<String>,
    #[serde(default = "default_head_id")]
    pub head_id: String,
    #[serde(default)]
    pub trail_version_id: Option<String>,
    #[serde(default)]
    pub waypoint_id: Option<String>,

    #[serde(default)]
    pub actor: Option<Actor>,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl EventRequest {
    /// True when the server should assign the seq atomically.
    #[must_use]
    pub const fn wants_auto_seq(&self) -> bool {
        self.seq.is_none()
    }

    /// Fill in server-side defaults and build the envelope to append.
    #[must_use]
    pub fn into_envelope(self) -> EventEnvelope {
        EventEnvelope {
            event_id: self
                .event_id
                .unwrap_or_else(|| Uuid::now_v7().simple().to_string()),
            session_id: self.session_id,
            // Placeholder under auto_seq; replaced atomically by the store
            seq: self.seq.unwrap_or(0),
            ts: self.ts.unwrap_or_else(Utc::now),
            parent_event_id: self.parent_event_id,
            head_id: self.head_id,
            trail_version_id: self.trail_version_id,
            waypoint_id: self.waypoint_id,
            actor: self.actor.unwrap_or(Actor {
                kind: ActorKind::System,
                id: None,
            }),
            payload: self.payload,
        }
    }
}

/// Query parameters for `GET /session/{id}/events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub head_id: Option<String>,
    #[serde(default)]
    pub from_seq: Option<u64>,
    #[serde(default)]
    pub to_seq: Option<u64>,
    #[serde(default)]
    pub event_type: Option<EventType>,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Response after creating an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub event_id: String,
    pub seq: u64,
    pub ts: DateTime<Utc>,
}

/// Summary of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListItem {
    pub session_id: String,
    pub event_count: usize,
    pub last_event_seq: i64,
    pub last_event_ts: Option<DateTime<Utc>>,
}

/// Response for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// An API-level error: a status code plus a JSON detail body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }
}

impl From<WayfarerError> for ApiError {
    fn from(err: WayfarerError) -> Self {
        let status = match &err {
            WayfarerError::Conflict(_) => StatusCode::CONFLICT,
            WayfarerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WayfarerError::NotFound(_) => StatusCode::NOT_FOUND,
            WayfarerError::Serialization(_) | WayfarerError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

// =============================================================================
// SESSION ID VALIDATION
// =============================================================================

/// Session ids are path segments and index keys: 1-128 chars of
/// `[A-Za-z0-9_-]`, rejected with 400 otherwise.
#[must_use]
pub fn is_valid_session_id(session_id: &str) -> bool {
    (1..=128).contains(&session_id.len())
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn session_id_validation() {
        assert!(is_valid_session_id("abc-123_X"));
        assert!(is_valid_session_id("a"));
        assert!(is_valid_session_id(&"x".repeat(128)));

        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id(&"x".repeat(129)));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("dot.dot"));
        assert!(!is_valid_session_id("slash/"));
    }

    #[test]
    fn request_defaults_fill_in() {
        let raw = serde_json::json!({
            "session_id": "s1",
            "type": "IntentCreated",
            "payload": {"goal": "learn rust"}
        });
        let request: EventRequest = serde_json::from_value(raw).expect("deserialize");
        assert!(request.wants_auto_seq());

        let envelope = request.into_envelope();
        assert_eq!(envelope.event_id.len(), 32); // simple-format UUID
        assert_eq!(envelope.head_id, DEFAULT_HEAD);
        assert_eq!(envelope.actor.kind, ActorKind::System);
        assert_eq!(envelope.event_type(), EventType::IntentCreated);
    }

    #[test]
    fn explicit_fields_are_kept() {
        let raw = serde_json::json!({
            "event_id": "e42",
            "session_id": "s1",
            "seq": 7,
            "head_id": "experiment",
            "type": "IntentCreated",
            "payload": {"goal": "g"}
        });
        let request: EventRequest = serde_json::from_value(raw).expect("deserialize");
        assert!(!request.wants_auto_seq());
        let envelope = request.into_envelope();
        assert_eq!(envelope.event_id, "e42");
        assert_eq!(envelope.seq, 7);
        assert_eq!(envelope.head_id, "experiment");
    }
}
