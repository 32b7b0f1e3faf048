use eventhive_shared::Booking;
use std::sync::{PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// Admitted bookings for a single event, in creation order.
#[derive(Debug, Default, Clone)]
pub struct LedgerState {
    bookings: Vec<Booking>,
    admitted_tickets: u64,
}

impl LedgerState {
    pub fn from_history(bookings: Vec<Booking>) -> Self {
        let admitted_tickets = bookings.iter().map(|b| u64::from(b.tickets)).sum();
        Self {
            bookings,
            admitted_tickets,
        }
    }

    pub fn admitted_tickets(&self) -> u64 {
        self.admitted_tickets
    }

    /// Remaining inventory against `capacity`, never below zero.
    pub fn available(&self, capacity: u32) -> u32 {
        let remaining = u64::from(capacity).saturating_sub(self.admitted_tickets);
        u32::try_from(remaining).unwrap_or(u32::MAX)
    }

    pub fn record(&mut self, booking: Booking) {
        self.admitted_tickets += u64::from(booking.tickets);
        self.bookings.push(booking);
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }
}

/// Per-event admission scope.
///
/// `admission` serializes check-and-commit for this event only. `state` is
/// written solely by the holder of `admission`, after the journal has
/// accepted the booking, so readers always see whole bookings.
#[derive(Debug, Default)]
pub struct EventLedger {
    admission: Mutex<()>,
    state: RwLock<LedgerState>,
}

impl EventLedger {
    pub fn hydrate(history: Vec<Booking>) -> Self {
        Self {
            admission: Mutex::new(()),
            state: RwLock::new(LedgerState::from_history(history)),
        }
    }

    /// Waits for exclusive admission rights on this event.
    pub async fn admit(&self) -> MutexGuard<'_, ()> {
        self.admission.lock().await
    }

    pub fn available(&self, capacity: u32) -> u32 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .available(capacity)
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bookings()
            .to_vec()
    }

    /// Appends an already-journaled booking and returns the new availability.
    /// Callers must hold the guard returned by [`EventLedger::admit`].
    pub fn record(&self, booking: Booking, capacity: u32) -> u32 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.record(booking);
        state.available(capacity)
    }

    /// Replaces the in-memory view with the journal's. Used when the journal
    /// reports a conflict the ledger did not predict.
    pub fn resync(&self, history: Vec<Booking>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = LedgerState::from_history(history);
    }
}
