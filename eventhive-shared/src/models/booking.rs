use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Event, Purchaser};

/// An admitted reservation. Bookings are never mutated after admission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub tickets: u32,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(event_id: Uuid, purchaser: &Purchaser, tickets: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id: purchaser.id,
            user_name: purchaser.name.clone(),
            user_email: purchaser.email.0.clone(),
            tickets,
            created_at: Utc::now(),
        }
    }
}

/// Payload encoded into the attendee's scannable ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketPass {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub user: String,
    pub tickets: u32,
}

impl TicketPass {
    pub fn issue(booking: &Booking, event: &Event) -> Self {
        Self {
            booking_id: booking.id,
            event_id: event.id,
            event_name: event.title.clone(),
            user: booking.user_name.clone(),
            tickets: booking.tickets,
        }
    }

    /// Compact JSON form, suitable for rendering as a QR code.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
