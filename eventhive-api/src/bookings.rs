use axum::{
    extract::{Path, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use eventhive_core::{Admission, BookingError, EventRoster, RequestBooking};
use eventhive_shared::{Booking, Purchaser, TicketPass};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{organizer_middleware, Session},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub quantity: serde_json::Number,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking: Booking,
    pub ticket: TicketPass,
    pub ticket_code: String,
    pub total_price_cents: i64,
}

pub fn routes() -> Router<AppState> {
    let organizer_only = || middleware::from_fn(organizer_middleware);

    Router::new()
        .route(
            "/v1/events/{id}/bookings",
            post(create_booking).get(event_roster.layer(organizer_only())),
        )
        .route("/v1/organizer/rosters", get(organizer_rosters.layer(organizer_only())))
}

/// Whole numbers only; `2.0` is accepted, `1.5` is not.
fn whole_quantity(quantity: &serde_json::Number) -> Option<i64> {
    quantity.as_i64().or_else(|| {
        quantity
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Re-resolves the session through the identity provider so deleted or
/// unknown accounts cannot book.
async fn purchaser_for(state: &AppState, session: &Session) -> Result<Option<Purchaser>, AppError> {
    let Some(claims) = session.0.as_ref() else {
        return Ok(None);
    };
    let user = state.identity.find(claims.sub).await?;
    Ok(user.map(|u| u.as_purchaser()))
}

fn rejected(state: &AppState, err: BookingError) -> AppError {
    state.metrics.record_rejected(err.reason());
    err.into()
}

/// POST /v1/events/{id}/bookings
async fn create_booking(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(session): Extension<Session>,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    // Same order as the engine: purchaser first, then quantity.
    let Some(purchaser) = purchaser_for(&state, &session).await? else {
        return Err(rejected(&state, BookingError::Unauthenticated));
    };
    let Some(quantity) = whole_quantity(&req.quantity) else {
        state.metrics.record_rejected("invalid_quantity");
        return Err(AppError::ValidationError(format!(
            "Invalid ticket quantity: {}",
            req.quantity
        )));
    };

    let Admission { booking, event } = state
        .engine
        .request_booking(RequestBooking {
            event_id,
            purchaser: Some(purchaser),
            quantity,
        })
        .await
        .map_err(|e| rejected(&state, e))?;
    state.metrics.record_admitted(booking.tickets);

    let ticket = TicketPass::issue(&booking, &event);
    let ticket_code = ticket.encode().map_err(anyhow::Error::from)?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            total_price_cents: event.price_for(booking.tickets),
            booking,
            ticket,
            ticket_code,
        }),
    ))
}

/// GET /v1/events/{id}/bookings
/// Attendees for one event; only its organizer may look.
async fn event_roster(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(session): Extension<Session>,
) -> Result<Json<EventRoster>, AppError> {
    let organizer = session
        .0
        .ok_or_else(|| AppError::AuthenticationError("Sign in required".to_string()))?;

    let event = state
        .catalog
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Event not found.".to_string()))?;
    if !event.is_organized_by(organizer.sub) {
        return Err(AppError::AuthorizationError(
            "Only the event's organizer can view its attendees".to_string(),
        ));
    }

    let bookings = state.engine.list_bookings(event_id).await?;
    let available = state.engine.available_tickets(event_id).await?;
    Ok(Json(EventRoster::new(event, bookings, available)))
}

/// GET /v1/organizer/rosters
async fn organizer_rosters(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<EventRoster>>, AppError> {
    let organizer = session
        .0
        .ok_or_else(|| AppError::AuthenticationError("Sign in required".to_string()))?;

    let rosters = state.engine.list_bookings_for_organizer(organizer.sub).await?;
    Ok(Json(rosters))
}
