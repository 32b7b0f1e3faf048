use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::state::AppState;

/// Admission counters exposed on `/metrics`.
pub struct Metrics {
    registry: Registry,
    pub bookings_admitted: IntCounter,
    pub tickets_admitted: IntCounter,
    pub bookings_rejected: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bookings_admitted = IntCounter::new(
            "eventhive_bookings_admitted_total",
            "Bookings durably admitted",
        )?;
        let tickets_admitted = IntCounter::new(
            "eventhive_tickets_admitted_total",
            "Tickets across all admitted bookings",
        )?;
        let bookings_rejected = IntCounterVec::new(
            Opts::new("eventhive_bookings_rejected_total", "Booking requests refused"),
            &["reason"],
        )?;

        registry.register(Box::new(bookings_admitted.clone()))?;
        registry.register(Box::new(tickets_admitted.clone()))?;
        registry.register(Box::new(bookings_rejected.clone()))?;

        Ok(Self {
            registry,
            bookings_admitted,
            tickets_admitted,
            bookings_rejected,
        })
    }

    pub fn record_admitted(&self, tickets: u32) {
        self.bookings_admitted.inc();
        self.tickets_admitted.inc_by(u64::from(tickets));
    }

    pub fn record_rejected(&self, reason: &str) {
        self.bookings_rejected.with_label_values(&[reason]).inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => crate::error::AppError::InternalServerError(e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render() {
        let metrics = Metrics::new().unwrap();
        metrics.record_admitted(3);
        metrics.record_rejected("insufficient_inventory");

        let text = metrics.render().unwrap();
        assert!(text.contains("eventhive_bookings_admitted_total 1"));
        assert!(text.contains("eventhive_tickets_admitted_total 3"));
        assert!(text.contains("reason=\"insufficient_inventory\""));
    }
}
