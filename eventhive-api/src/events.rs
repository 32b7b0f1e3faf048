use axum::{
    extract::{Path, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use eventhive_catalog::EventDraft;
use eventhive_shared::Event;
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{organizer_middleware, Session},
    state::AppState,
};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub available_tickets: u32,
    pub sold_out: bool,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub event_id: Uuid,
    pub total_tickets: u32,
    pub available_tickets: u32,
    pub sold_out: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/events",
            get(list_events).post(create_event.layer(middleware::from_fn(organizer_middleware))),
        )
        .route("/v1/events/{id}", get(get_event))
        .route("/v1/events/{id}/availability", get(get_availability))
        .route("/v1/events/{id}/stream", get(stream_availability))
}

async fn summarize(state: &AppState, event: Event) -> Result<EventSummary, AppError> {
    let available_tickets = state.engine.available_tickets(event.id).await?;
    Ok(EventSummary {
        event,
        available_tickets,
        sold_out: available_tickets == 0,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/events
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventSummary>>, AppError> {
    let events = state.catalog.list_events().await?;
    let mut summaries = Vec::with_capacity(events.len());
    for event in events {
        summaries.push(summarize(&state, event).await?);
    }
    Ok(Json(summaries))
}

/// GET /v1/events/{id}
async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventSummary>, AppError> {
    let event = state
        .catalog
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Event not found.".to_string()))?;
    Ok(Json(summarize(&state, event).await?))
}

/// POST /v1/events
/// Organizer only; the caller becomes the event's organizer.
async fn create_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<EventSummary>), AppError> {
    let organizer = session
        .0
        .ok_or_else(|| AppError::AuthenticationError("Sign in to create events".to_string()))?;

    let event = state.catalog.create_event(organizer.sub, draft).await?;
    Ok((StatusCode::CREATED, Json(summarize(&state, event).await?)))
}

/// GET /v1/events/{id}/availability
async fn get_availability(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let summary = get_event(State(state), Path(event_id)).await?.0;
    Ok(Json(AvailabilityResponse {
        event_id,
        total_tickets: summary.event.total_tickets,
        available_tickets: summary.available_tickets,
        sold_out: summary.sold_out,
    }))
}

/// GET /v1/events/{id}/stream
/// Server-sent `availability` events, one per admitted booking.
async fn stream_availability(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, axum::Error>>>, AppError> {
    // 404 before opening the stream.
    state.engine.available_tickets(event_id).await?;

    let rx = state.engine.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(note) if note.event_id == event_id => {
                Some(SseEvent::default().event("availability").json_data(&note))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Availability stream for {} lagged: {}", event_id, e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
