use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Organizer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Organizer => "ORGANIZER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(UserRole::User),
            "ORGANIZER" => Some(UserRole::Organizer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl User {
    pub fn is_organizer(&self) -> bool {
        self.role == UserRole::Organizer
    }

    pub fn as_purchaser(&self) -> Purchaser {
        Purchaser {
            id: self.id,
            name: self.name.clone(),
            email: Masked(self.email.clone()),
        }
    }
}

/// Resolved identity attached to a booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchaser {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
}
