use eventhive_shared::{Booking, Event};
use serde::Serialize;

/// Attendee list for one event, as shown on the organizer dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EventRoster {
    pub event: Event,
    pub bookings: Vec<Booking>,
    pub total_attendees: u64,
    pub available_tickets: u32,
}

impl EventRoster {
    pub fn new(event: Event, bookings: Vec<Booking>, available_tickets: u32) -> Self {
        let total_attendees = bookings.iter().map(|b| u64::from(b.tickets)).sum();
        Self {
            event,
            bookings,
            total_attendees,
            available_tickets,
        }
    }
}
