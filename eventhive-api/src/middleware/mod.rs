pub mod auth;

pub use auth::{organizer_middleware, session_middleware, Session, SessionClaims};
