pub mod models;
pub mod pii;

pub use models::{Booking, Event, Purchaser, TicketPass, User, UserRole};
