use async_trait::async_trait;
use eventhive_shared::Event;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::draft::EventDraft;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid event: {0}")]
    Validation(String),

    #[error("Catalog storage failure: {0}")]
    Storage(String),
}

/// Read/write access to published events.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_event(&self, organizer_id: Uuid, draft: EventDraft) -> Result<Event, CatalogError>;

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, CatalogError>;

    /// All events, soonest first.
    async fn list_events(&self) -> Result<Vec<Event>, CatalogError>;

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, CatalogError>;
}

/// Catalog held in process memory.
pub struct InMemoryCatalog {
    events: RwLock<HashMap<Uuid, Event>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn chronological(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.title.cmp(&b.title)));
    events
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn create_event(&self, organizer_id: Uuid, draft: EventDraft) -> Result<Event, CatalogError> {
        let event = draft.into_event(organizer_id)?;
        self.events.write().await.insert(event.id, event.clone());
        tracing::info!("Published event {} ({} tickets)", event.id, event.total_tickets);
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, CatalogError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, CatalogError> {
        let events = self.events.read().await.values().cloned().collect();
        Ok(chronological(events))
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, CatalogError> {
        let events = self
            .events
            .read()
            .await
            .values()
            .filter(|e| e.is_organized_by(organizer_id))
            .cloned()
            .collect();
        Ok(chronological(events))
    }
}
