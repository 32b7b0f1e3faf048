use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published event with a fixed ticket capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub price_cents: i64,
    pub total_tickets: u32,
    pub organizer_id: Uuid,
    pub image_url: String,
}

impl Event {
    pub fn is_organized_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    /// Total price for `tickets` seats, in minor units.
    pub fn price_for(&self, tickets: u32) -> i64 {
        self.price_cents.saturating_mul(i64::from(tickets))
    }
}
