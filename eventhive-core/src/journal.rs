use async_trait::async_trait;
use eventhive_shared::Booking;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// The store's own capacity check refused the append.
    #[error("Capacity exceeded: {available} tickets left")]
    CapacityExceeded { available: u32 },

    #[error("Journal storage failure: {0}")]
    Storage(String),
}

/// Durable record of admitted bookings.
///
/// `append` is the admission's commit point: a booking counts as admitted
/// only once it returns `Ok`. Implementations must re-check
/// `sum(tickets) + booking.tickets <= capacity` atomically with the write.
#[async_trait]
pub trait BookingJournal: Send + Sync {
    /// Bookings for one event, oldest first.
    async fn load_event(&self, event_id: Uuid) -> Result<Vec<Booking>, JournalError>;

    async fn append(&self, booking: &Booking, capacity: u32) -> Result<(), JournalError>;
}

/// Journal kept in process memory. Each event has its own log and lock, so
/// appends for different events never contend.
#[derive(Default)]
pub struct InMemoryJournal {
    events: RwLock<HashMap<Uuid, Arc<Mutex<Vec<Booking>>>>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    async fn event_log(&self, event_id: Uuid) -> Arc<Mutex<Vec<Booking>>> {
        if let Some(log) = self.events.read().await.get(&event_id) {
            return Arc::clone(log);
        }
        let mut events = self.events.write().await;
        Arc::clone(events.entry(event_id).or_default())
    }
}

#[async_trait]
impl BookingJournal for InMemoryJournal {
    async fn load_event(&self, event_id: Uuid) -> Result<Vec<Booking>, JournalError> {
        let log = self.events.read().await.get(&event_id).cloned();
        match log {
            Some(log) => Ok(log.lock().await.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, booking: &Booking, capacity: u32) -> Result<(), JournalError> {
        let log = self.event_log(booking.event_id).await;
        let mut bookings = log.lock().await;
        let sold: u64 = bookings.iter().map(|b| u64::from(b.tickets)).sum();

        if sold + u64::from(booking.tickets) > u64::from(capacity) {
            let available = u64::from(capacity).saturating_sub(sold);
            return Err(JournalError::CapacityExceeded {
                available: u32::try_from(available).unwrap_or(u32::MAX),
            });
        }

        bookings.push(booking.clone());
        Ok(())
    }
}
