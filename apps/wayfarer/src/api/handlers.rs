//! # API Request Handlers
//!
//! Every handler is a thin adapter: validate the path/query inputs, call
//! one store or reducer operation, map the result into a JSON response.
//! Domain errors carry their HTTP status through `ApiError`.

use axum::extract::{Path, Query, State};
use axum::Json;
use wayfarer_core::{reduce_session_state, EventEnvelope, EventFilter, SessionState};

use super::types::{
    is_valid_session_id, ApiError, EventRequest, EventResponse, EventsQuery, HealthResponse,
    SessionListItem,
};
use super::AppState;

// =============================================================================
// HEALTH
// =============================================================================

/// `GET /health` - liveness probe, never authenticated.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

// =============================================================================
// EVENTS
// =============================================================================

/// `POST /events` - append one event to the log.
///
/// Omitting `seq` requests atomic server-side assignment; an explicit
/// `seq` must be unused or the append fails with 409.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    if !is_valid_session_id(&request.session_id) {
        return Err(ApiError::bad_request(format!(
            "invalid session_id: {}",
            request.session_id
        )));
    }

    let auto_seq = request.wants_auto_seq();
    let stored = state.store.append(&request.into_envelope(), auto_seq)?;

    tracing::info!(
        event = "event_appended",
        session_id = %stored.session_id,
        seq = stored.seq,
        event_type = %stored.event_type(),
        "Event appended"
    );

    Ok(Json(EventResponse {
        event_id: stored.event_id,
        seq: stored.seq,
        ts: stored.ts,
    }))
}

/// `GET /event/{event_id}` - fetch one event by id.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventEnvelope>, ApiError> {
    let event = state
        .store
        .get_event(&event_id)?
        .ok_or_else(|| ApiError::not_found(format!("event not found: {event_id}")))?;
    Ok(Json(event))
}

// =============================================================================
// SESSIONS
// =============================================================================

/// `GET /session/{session_id}/state` - reduce the full log into derived state.
pub async fn get_session_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionState>, ApiError> {
    if !is_valid_session_id(&session_id) {
        return Err(ApiError::bad_request(format!(
            "invalid session_id: {session_id}"
        )));
    }
    if !state.store.session_exists(&session_id)? {
        return Err(ApiError::not_found(format!(
            "session not found: {session_id}"
        )));
    }

    let events = state.store.get_events(&session_id, &EventFilter::default())?;
    Ok(Json(reduce_session_state(&session_id, &events)))
}

/// `GET /session/{session_id}/events` - list events, optionally filtered by
/// head, seq range, and event type.
pub async fn get_session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventEnvelope>>, ApiError> {
    if !is_valid_session_id(&session_id) {
        return Err(ApiError::bad_request(format!(
            "invalid session_id: {session_id}"
        )));
    }
    if !state.store.session_exists(&session_id)? {
        return Err(ApiError::not_found(format!(
            "session not found: {session_id}"
        )));
    }

    let filter = EventFilter {
        head_id: query.head_id,
        from_seq: query.from_seq,
        to_seq: query.to_seq,
        event_type: query.event_type,
    };
    let events = state.store.get_events(&session_id, &filter)?;
    Ok(Json(events))
}

/// `GET /sessions` - summarize every known session.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionListItem>>, ApiError> {
    let mut items = Vec::new();
    for session_id in state.store.list_sessions()? {
        let events = state.store.get_events(&session_id, &EventFilter::default())?;
        let last = events.last();
        items.push(SessionListItem {
            session_id,
            event_count: events.len(),
            last_event_seq: last.map_or(-1, |e| e.seq as i64),
            last_event_ts: last.map(|e| e.ts),
        });
    }
    Ok(Json(items))
}
