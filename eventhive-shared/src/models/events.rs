use uuid::Uuid;

/// Broadcast after a booking is durably admitted.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingAdmittedEvent {
    pub event_id: Uuid,
    pub booking_id: Uuid,
    pub tickets: u32,
    pub available_tickets: u32,
    pub admitted_at: i64,
}
