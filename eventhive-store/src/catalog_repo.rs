use async_trait::async_trait;
use eventhive_catalog::{CatalogError, CatalogStore, EventDraft};
use eventhive_shared::Event;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    starts_at: chrono::DateTime<chrono::Utc>,
    location: String,
    price_cents: i64,
    total_tickets: i32,
    organizer_id: Uuid,
    image_url: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            starts_at: row.starts_at,
            location: row.location,
            price_cents: row.price_cents,
            // CHECK (total_tickets >= 0) holds in the schema.
            total_tickets: u32::try_from(row.total_tickets).unwrap_or(0),
            organizer_id: row.organizer_id,
            image_url: row.image_url,
        }
    }
}

const EVENT_COLUMNS: &str =
    "id, title, description, starts_at, location, price_cents, total_tickets, organizer_id, image_url";

fn storage(e: sqlx::Error) -> CatalogError {
    CatalogError::Storage(e.to_string())
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn create_event(&self, organizer_id: Uuid, draft: EventDraft) -> Result<Event, CatalogError> {
        let event = draft.into_event(organizer_id)?;
        let total_tickets = i32::try_from(event.total_tickets)
            .map_err(|_| CatalogError::Validation("total_tickets is too large".to_string()))?;

        sqlx::query(
            "INSERT INTO events (id, title, description, starts_at, location, price_cents, total_tickets, organizer_id, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.starts_at)
        .bind(&event.location)
        .bind(event.price_cents)
        .bind(total_tickets)
        .bind(event.organizer_id)
        .bind(&event.image_url)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        tracing::info!("Published event {} ({} tickets)", event.id, event.total_tickets);
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, CatalogError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(Event::from))
    }

    async fn list_events(&self) -> Result<Vec<Event>, CatalogError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events ORDER BY starts_at, title",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, CatalogError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE organizer_id = $1 ORDER BY starts_at, title",
            EVENT_COLUMNS
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }
}
