pub mod booking;
pub mod event;
pub mod events;
pub mod user;

pub use booking::{Booking, TicketPass};
pub use event::Event;
pub use user::{Purchaser, User, UserRole};
