use chrono::{DateTime, Utc};
use eventhive_shared::Event;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::CatalogError;

/// Organizer-submitted event details, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub price_cents: i64,
    pub total_tickets: u32,
    pub image_url: String,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("image_url", &self.image_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::Validation(format!("{} is required", field)));
            }
        }

        if self.total_tickets == 0 {
            return Err(CatalogError::Validation(
                "total_tickets must be at least 1".to_string(),
            ));
        }

        if self.price_cents < 0 {
            return Err(CatalogError::Validation(
                "price_cents cannot be negative".to_string(),
            ));
        }

        let url = self.image_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(CatalogError::Validation(
                "image_url must be an http(s) URL".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the draft and stamps it with a fresh id and its organizer.
    pub fn into_event(self, organizer_id: Uuid) -> Result<Event, CatalogError> {
        self.validate()?;
        Ok(Event {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            starts_at: self.starts_at,
            location: self.location.trim().to_string(),
            price_cents: self.price_cents,
            total_tickets: self.total_tickets,
            organizer_id,
            image_url: self.image_url.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EventDraft {
        EventDraft {
            title: "Future of Tech Summit".to_string(),
            description: "Industry leaders on what comes next.".to_string(),
            starts_at: Utc::now(),
            location: "Metropolis Convention Center".to_string(),
            price_cents: 19999,
            total_tickets: 1500,
            image_url: "https://picsum.photos/seed/tech/600/400".to_string(),
        }
    }

    #[test]
    fn test_valid_draft_becomes_event() {
        let organizer = Uuid::new_v4();
        let event = draft().into_event(organizer).unwrap();
        assert_eq!(event.organizer_id, organizer);
        assert_eq!(event.total_tickets, 1500);
        assert_eq!(event.price_for(2), 39998);
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        match d.validate() {
            Err(CatalogError::Validation(msg)) => assert!(msg.contains("title")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut d = draft();
        d.total_tickets = 0;
        assert!(matches!(d.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_non_http_image_rejected() {
        let mut d = draft();
        d.image_url = "ftp://example.com/a.png".to_string();
        assert!(matches!(d.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut d = draft();
        d.price_cents = -1;
        assert!(d.validate().is_err());
    }
}
