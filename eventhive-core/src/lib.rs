pub mod admission;
pub mod identity;
pub mod journal;
pub mod ledger;
pub mod roster;

pub use admission::{Admission, AdmissionEngine, RequestBooking};
pub use identity::{IdentityError, IdentityProvider, InMemoryIdentityProvider, Registration};
pub use journal::{BookingJournal, InMemoryJournal, JournalError};
pub use roster::EventRoster;

use uuid::Uuid;

/// Why a booking request was not admitted. Every variant leaves inventory untouched.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Unknown event: {0}")]
    UnknownEvent(Uuid),

    #[error("Invalid ticket quantity: {0}")]
    InvalidQuantity(i64),

    #[error("A signed-in purchaser is required to book tickets")]
    Unauthenticated,

    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        requested: u32,
        available: u32,
    },

    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    #[error("Booking could not be recorded: {0}")]
    Journal(String),
}

impl BookingError {
    /// Stable label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingError::UnknownEvent(_) => "unknown_event",
            BookingError::InvalidQuantity(_) => "invalid_quantity",
            BookingError::Unauthenticated => "unauthenticated",
            BookingError::InsufficientInventory { .. } => "insufficient_inventory",
            BookingError::Catalog(_) => "catalog",
            BookingError::Journal(_) => "journal",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
