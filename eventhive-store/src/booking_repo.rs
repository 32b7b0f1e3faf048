use async_trait::async_trait;
use eventhive_core::journal::{BookingJournal, JournalError};
use eventhive_shared::Booking;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Booking journal backed by the `bookings` table.
pub struct PgBookingJournal {
    pool: PgPool,
}

impl PgBookingJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    tickets: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = JournalError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let tickets = u32::try_from(row.tickets).map_err(|_| {
            JournalError::Storage(format!("booking {} has negative tickets", row.id))
        })?;
        Ok(Booking {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            tickets,
            created_at: row.created_at,
        })
    }
}

fn storage(e: sqlx::Error) -> JournalError {
    JournalError::Storage(e.to_string())
}

#[async_trait]
impl BookingJournal for PgBookingJournal {
    async fn load_event(&self, event_id: Uuid) -> Result<Vec<Booking>, JournalError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT id, event_id, user_id, user_name, user_email, tickets, created_at \
             FROM bookings WHERE event_id = $1 ORDER BY seq",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn append(&self, booking: &Booking, capacity: u32) -> Result<(), JournalError> {
        let tickets = i32::try_from(booking.tickets)
            .map_err(|_| JournalError::Storage("ticket count out of range".to_string()))?;

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Serializes appends per event across every process sharing the database.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(booking.event_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let sold: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(tickets), 0)::BIGINT FROM bookings WHERE event_id = $1",
        )
        .bind(booking.event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        let remaining = i64::from(capacity) - sold;
        if i64::from(tickets) > remaining {
            // Dropping `tx` rolls back.
            return Err(JournalError::CapacityExceeded {
                available: u32::try_from(remaining.max(0)).unwrap_or(0),
            });
        }

        sqlx::query(
            "INSERT INTO bookings (id, event_id, user_id, user_name, user_email, tickets, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(booking.id)
        .bind(booking.event_id)
        .bind(booking.user_id)
        .bind(&booking.user_name)
        .bind(&booking.user_email)
        .bind(tickets)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        info!("Journaled booking {} for event {}", booking.id, booking.event_id);
        Ok(())
    }
}
