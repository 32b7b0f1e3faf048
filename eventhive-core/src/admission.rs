use eventhive_catalog::CatalogStore;
use eventhive_shared::models::events::BookingAdmittedEvent;
use eventhive_shared::{Booking, Event, Purchaser};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::journal::{BookingJournal, JournalError};
use crate::ledger::EventLedger;
use crate::roster::EventRoster;
use crate::{BookingError, BookingResult};

/// A request to reserve `quantity` tickets for `event_id`.
#[derive(Debug, Clone)]
pub struct RequestBooking {
    pub event_id: Uuid,
    pub purchaser: Option<Purchaser>,
    pub quantity: i64,
}

/// A durably admitted booking and the event it was admitted against.
#[derive(Debug, Clone)]
pub struct Admission {
    pub booking: Booking,
    pub event: Event,
}

/// Decides and records ticket admissions.
///
/// Admission for one event is serialized through that event's
/// [`EventLedger`]; different events never wait on each other.
pub struct AdmissionEngine {
    catalog: Arc<dyn CatalogStore>,
    journal: Arc<dyn BookingJournal>,
    ledgers: RwLock<HashMap<Uuid, Arc<EventLedger>>>,
    admitted_tx: broadcast::Sender<BookingAdmittedEvent>,
}

impl AdmissionEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, journal: Arc<dyn BookingJournal>) -> Self {
        let (admitted_tx, _) = broadcast::channel(256);
        Self {
            catalog,
            journal,
            ledgers: RwLock::new(HashMap::new()),
            admitted_tx,
        }
    }

    /// Notifications for every successful admission, across all events.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingAdmittedEvent> {
        self.admitted_tx.subscribe()
    }

    pub async fn available_tickets(&self, event_id: Uuid) -> BookingResult<u32> {
        let event = self.resolve_event(event_id).await?;
        let ledger = self.ledger(event_id).await?;
        Ok(ledger.available(event.total_tickets))
    }

    /// Admits the booking or rejects it with no effect.
    ///
    /// The check, journal append and ledger update run on their own task.
    /// Dropping the returned future only stops the caller from waiting; an
    /// append already under way still reaches the ledger.
    pub async fn request_booking(&self, request: RequestBooking) -> BookingResult<Admission> {
        let purchaser = request.purchaser.ok_or(BookingError::Unauthenticated)?;
        let tickets = match u32::try_from(request.quantity) {
            Ok(n) if n > 0 => n,
            _ => return Err(BookingError::InvalidQuantity(request.quantity)),
        };
        let event = self.resolve_event(request.event_id).await?;
        let ledger = self.ledger(event.id).await?;

        let commit = AdmissionCommit {
            journal: Arc::clone(&self.journal),
            ledger,
            admitted_tx: self.admitted_tx.clone(),
        };
        tokio::spawn(commit.run(event, purchaser, tickets))
            .await
            .map_err(|e| BookingError::Journal(format!("admission task failed: {}", e)))?
    }

    /// Admitted bookings for an event, in creation order.
    pub async fn list_bookings(&self, event_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.resolve_event(event_id).await?;
        let ledger = self.ledger(event_id).await?;
        Ok(ledger.bookings())
    }

    pub async fn list_bookings_for_organizer(
        &self,
        organizer_id: Uuid,
    ) -> BookingResult<Vec<EventRoster>> {
        let events = self
            .catalog
            .list_by_organizer(organizer_id)
            .await
            .map_err(|e| BookingError::Catalog(e.to_string()))?;

        let mut rosters = Vec::with_capacity(events.len());
        for event in events {
            let ledger = self.ledger(event.id).await?;
            let available = ledger.available(event.total_tickets);
            rosters.push(EventRoster::new(event, ledger.bookings(), available));
        }
        Ok(rosters)
    }

    async fn resolve_event(&self, event_id: Uuid) -> BookingResult<Event> {
        self.catalog
            .get_event(event_id)
            .await
            .map_err(|e| BookingError::Catalog(e.to_string()))?
            .ok_or(BookingError::UnknownEvent(event_id))
    }

    /// Finds the event's ledger, hydrating it from the journal on first use.
    async fn ledger(&self, event_id: Uuid) -> BookingResult<Arc<EventLedger>> {
        if let Some(ledger) = self.ledgers.read().await.get(&event_id) {
            return Ok(Arc::clone(ledger));
        }

        let history = self
            .journal
            .load_event(event_id)
            .await
            .map_err(|e| BookingError::Journal(e.to_string()))?;

        // A concurrent caller may have inserted first; theirs wins.
        let mut ledgers = self.ledgers.write().await;
        let ledger = ledgers
            .entry(event_id)
            .or_insert_with(|| Arc::new(EventLedger::hydrate(history)));
        Ok(Arc::clone(ledger))
    }
}

/// The locked half of an admission, owned so it can outlive the request.
struct AdmissionCommit {
    journal: Arc<dyn BookingJournal>,
    ledger: Arc<EventLedger>,
    admitted_tx: broadcast::Sender<BookingAdmittedEvent>,
}

impl AdmissionCommit {
    async fn run(self, event: Event, purchaser: Purchaser, tickets: u32) -> BookingResult<Admission> {
        let _admission = self.ledger.admit().await;

        let available = self.ledger.available(event.total_tickets);
        if tickets > available {
            warn!(
                "Rejected {} tickets for event {}: {} left",
                tickets, event.id, available
            );
            return Err(BookingError::InsufficientInventory {
                requested: tickets,
                available,
            });
        }

        let booking = Booking::new(event.id, &purchaser, tickets);
        match self.journal.append(&booking, event.total_tickets).await {
            Ok(()) => {}
            Err(JournalError::CapacityExceeded { available }) => {
                warn!(
                    "Journal refused booking for event {}; resyncing ledger",
                    event.id
                );
                if let Ok(history) = self.journal.load_event(event.id).await {
                    self.ledger.resync(history);
                }
                return Err(BookingError::InsufficientInventory {
                    requested: tickets,
                    available,
                });
            }
            Err(e) => {
                error!("Failed to journal booking for event {}: {}", event.id, e);
                return Err(BookingError::Journal(e.to_string()));
            }
        }

        let remaining = self.ledger.record(booking.clone(), event.total_tickets);
        info!(
            "Admitted booking {} for {} ({} tickets, {} left)",
            booking.id, purchaser.email, tickets, remaining
        );

        // No subscribers is fine.
        let _ = self.admitted_tx.send(BookingAdmittedEvent {
            event_id: event.id,
            booking_id: booking.id,
            tickets,
            available_tickets: remaining,
            admitted_at: booking.created_at.timestamp(),
        });

        Ok(Admission { booking, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::InMemoryJournal;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use eventhive_catalog::{EventDraft, InMemoryCatalog};
    use eventhive_shared::pii::Masked;

    fn purchaser(name: &str) -> Purchaser {
        Purchaser {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: Masked(format!("{}@example.com", name.to_lowercase())),
        }
    }

    fn draft(total_tickets: u32) -> EventDraft {
        EventDraft {
            title: "Culinary Masters Cook-Off".to_string(),
            description: "Live cooking competition".to_string(),
            starts_at: Utc::now() + Duration::days(7),
            location: "Grand Plaza Ballroom".to_string(),
            price_cents: 12000,
            total_tickets,
            image_url: "https://picsum.photos/seed/food/600/400".to_string(),
        }
    }

    async fn engine_with_event(
        total_tickets: u32,
        journal: Arc<dyn BookingJournal>,
    ) -> (Arc<AdmissionEngine>, Uuid) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let event = catalog
            .create_event(Uuid::new_v4(), draft(total_tickets))
            .await
            .unwrap();
        (Arc::new(AdmissionEngine::new(catalog, journal)), event.id)
    }

    fn request(event_id: Uuid, who: Option<Purchaser>, quantity: i64) -> RequestBooking {
        RequestBooking {
            event_id,
            purchaser: who,
            quantity,
        }
    }

    /// Yields inside append so concurrent admissions actually interleave.
    struct SlowJournal {
        inner: InMemoryJournal,
    }

    #[async_trait]
    impl BookingJournal for SlowJournal {
        async fn load_event(&self, event_id: Uuid) -> Result<Vec<Booking>, JournalError> {
            self.inner.load_event(event_id).await
        }

        async fn append(&self, booking: &Booking, capacity: u32) -> Result<(), JournalError> {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.inner.append(booking, capacity).await
        }
    }

    /// Commits, then keeps the caller waiting as a database would while the
    /// commit acknowledgement is in flight.
    struct SlowAckJournal {
        inner: InMemoryJournal,
    }

    #[async_trait]
    impl BookingJournal for SlowAckJournal {
        async fn load_event(&self, event_id: Uuid) -> Result<Vec<Booking>, JournalError> {
            self.inner.load_event(event_id).await
        }

        async fn append(&self, booking: &Booking, capacity: u32) -> Result<(), JournalError> {
            self.inner.append(booking, capacity).await?;
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            Ok(())
        }
    }

    struct FailingJournal;

    #[async_trait]
    impl BookingJournal for FailingJournal {
        async fn load_event(&self, _event_id: Uuid) -> Result<Vec<Booking>, JournalError> {
            Ok(vec![])
        }

        async fn append(&self, _booking: &Booking, _capacity: u32) -> Result<(), JournalError> {
            Err(JournalError::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_exact_fit_then_sold_out() {
        let (engine, event_id) = engine_with_event(10, Arc::new(InMemoryJournal::new())).await;

        let admission = engine
            .request_booking(request(event_id, Some(purchaser("Alice")), 10))
            .await
            .unwrap();
        let booking = admission.booking;
        assert_eq!(admission.event.id, event_id);
        assert_eq!(booking.tickets, 10);
        assert_eq!(booking.user_name, "Alice");
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 0);

        let err = engine
            .request_booking(request(event_id, Some(purchaser("Bob")), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientInventory {
                requested: 1,
                available: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_quantities_rejected() {
        let (engine, event_id) = engine_with_event(10, Arc::new(InMemoryJournal::new())).await;

        for quantity in [0, -3, i64::from(u32::MAX) + 1] {
            let err = engine
                .request_booking(request(event_id, Some(purchaser("Alice")), quantity))
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::InvalidQuantity(q) if q == quantity));
        }
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_unknown_event() {
        let (engine, _) = engine_with_event(10, Arc::new(InMemoryJournal::new())).await;
        let missing = Uuid::new_v4();

        let err = engine
            .request_booking(request(missing, Some(purchaser("Alice")), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::UnknownEvent(id) if id == missing));
        assert!(matches!(
            engine.available_tickets(missing).await,
            Err(BookingError::UnknownEvent(_))
        ));
        assert!(matches!(
            engine.list_bookings(missing).await,
            Err(BookingError::UnknownEvent(_))
        ));
    }

    #[tokio::test]
    async fn test_unauthenticated_request_creates_nothing() {
        let journal = Arc::new(InMemoryJournal::new());
        let (engine, event_id) = engine_with_event(5, journal.clone()).await;

        let err = engine
            .request_booking(request(event_id, None, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unauthenticated));
        assert!(engine.list_bookings(event_id).await.unwrap().is_empty());
        assert!(journal.load_event(event_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_request_is_all_or_nothing() {
        let (engine, event_id) = engine_with_event(5, Arc::new(InMemoryJournal::new())).await;
        engine
            .request_booking(request(event_id, Some(purchaser("Alice")), 3))
            .await
            .unwrap();

        let err = engine
            .request_booking(request(event_id, Some(purchaser("Bob")), 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientInventory {
                requested: 3,
                available: 2
            }
        ));
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 2);
        assert_eq!(engine.list_bookings(event_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_journal_failure_admits_nothing() {
        let (engine, event_id) = engine_with_event(5, Arc::new(FailingJournal)).await;
        let mut rx = engine.subscribe();

        let err = engine
            .request_booking(request(event_id, Some(purchaser("Alice")), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Journal(_)));
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 5);
        assert!(engine.list_bookings(event_id).await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bookings_listed_in_creation_order() {
        let (engine, event_id) = engine_with_event(10, Arc::new(InMemoryJournal::new())).await;
        for (name, qty) in [("Alice", 1), ("Bob", 2), ("Carol", 3)] {
            engine
                .request_booking(request(event_id, Some(purchaser(name)), qty))
                .await
                .unwrap();
        }

        let names: Vec<_> = engine
            .list_bookings(event_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.user_name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_availability_is_monotonic_and_broadcast() {
        let (engine, event_id) = engine_with_event(6, Arc::new(InMemoryJournal::new())).await;
        let mut rx = engine.subscribe();

        let mut last = engine.available_tickets(event_id).await.unwrap();
        for _ in 0..3 {
            engine
                .request_booking(request(event_id, Some(purchaser("Alice")), 2))
                .await
                .unwrap();
            let now = engine.available_tickets(event_id).await.unwrap();
            assert!(now < last);
            last = now;

            let note = rx.recv().await.unwrap();
            assert_eq!(note.event_id, event_id);
            assert_eq!(note.available_tickets, now);
        }
        assert_eq!(last, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_ticket_race_has_one_winner() {
        let journal = Arc::new(SlowJournal {
            inner: InMemoryJournal::new(),
        });
        let (engine, event_id) = engine_with_event(1, journal).await;

        let a = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .request_booking(request(event_id, Some(purchaser("Alice")), 1))
                    .await
            })
        };
        let b = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .request_booking(request(event_id, Some(purchaser("Bob")), 1))
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let sold_out = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::InsufficientInventory { .. })))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(sold_out, 1);
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_capacity_holds_under_heavy_contention() {
        let journal = Arc::new(SlowJournal {
            inner: InMemoryJournal::new(),
        });
        let (engine, event_id) = engine_with_event(50, journal).await;

        let mut handles = Vec::new();
        for i in 0..200 {
            let engine = Arc::clone(&engine);
            let who = if i % 17 == 0 { None } else { Some(purchaser("Fan")) };
            let quantity = (i % 4) as i64; // includes zero
            handles.push(tokio::spawn(async move {
                engine.request_booking(request(event_id, who, quantity)).await
            }));
        }

        let mut admitted: u64 = 0;
        for handle in handles {
            if let Ok(admission) = handle.await.unwrap() {
                admitted += u64::from(admission.booking.tickets);
            }
        }

        let listed: u64 = engine
            .list_bookings(event_id)
            .await
            .unwrap()
            .iter()
            .map(|b| u64::from(b.tickets))
            .sum();

        assert!(admitted <= 50);
        assert_eq!(listed, admitted);
        assert_eq!(
            u64::from(engine.available_tickets(event_id).await.unwrap()),
            50 - admitted
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_events_admit_independently() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let organizer = Uuid::new_v4();
        let first = catalog.create_event(organizer, draft(3)).await.unwrap();
        let second = catalog.create_event(organizer, draft(3)).await.unwrap();
        let engine = Arc::new(AdmissionEngine::new(
            catalog,
            Arc::new(InMemoryJournal::new()),
        ));

        let mut handles = Vec::new();
        for event_id in [first.id, second.id] {
            for _ in 0..3 {
                let engine = Arc::clone(&engine);
                handles.push(tokio::spawn(async move {
                    engine
                        .request_booking(request(event_id, Some(purchaser("Alice")), 1))
                        .await
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(engine.available_tickets(first.id).await.unwrap(), 0);
        assert_eq!(engine.available_tickets(second.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_hydrates_from_journal_after_restart() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let event = catalog.create_event(Uuid::new_v4(), draft(4)).await.unwrap();
        let journal = Arc::new(InMemoryJournal::new());

        let first = AdmissionEngine::new(catalog.clone(), journal.clone());
        first
            .request_booking(request(event.id, Some(purchaser("Alice")), 3))
            .await
            .unwrap();
        drop(first);

        let restarted = AdmissionEngine::new(catalog, journal);
        assert_eq!(restarted.available_tickets(event.id).await.unwrap(), 1);
        assert_eq!(restarted.list_bookings(event.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_journal_conflict_resyncs_ledger() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let event = catalog.create_event(Uuid::new_v4(), draft(2)).await.unwrap();
        let journal = Arc::new(InMemoryJournal::new());
        let engine = AdmissionEngine::new(catalog, journal.clone());

        // Warm the ledger, then let another writer fill the event behind its back.
        assert_eq!(engine.available_tickets(event.id).await.unwrap(), 2);
        let outside = Booking::new(event.id, &purchaser("Other"), 2);
        journal.append(&outside, 2).await.unwrap();

        let err = engine
            .request_booking(request(event.id, Some(purchaser("Alice")), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientInventory { available: 0, .. }
        ));
        assert_eq!(engine.available_tickets(event.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_organizer_rosters() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let bob = Uuid::new_v4();
        let mine = catalog.create_event(bob, draft(10)).await.unwrap();
        let theirs = catalog.create_event(Uuid::new_v4(), draft(10)).await.unwrap();
        let engine = AdmissionEngine::new(catalog, Arc::new(InMemoryJournal::new()));

        engine
            .request_booking(request(mine.id, Some(purchaser("Alice")), 2))
            .await
            .unwrap();
        engine
            .request_booking(request(mine.id, Some(purchaser("Carol")), 3))
            .await
            .unwrap();
        engine
            .request_booking(request(theirs.id, Some(purchaser("Dan")), 1))
            .await
            .unwrap();

        let rosters = engine.list_bookings_for_organizer(bob).await.unwrap();
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].event.id, mine.id);
        assert_eq!(rosters[0].bookings.len(), 2);
        assert_eq!(rosters[0].total_attendees, 5);
        assert_eq!(rosters[0].available_tickets, 5);
    }

    #[tokio::test]
    async fn test_dropped_request_still_reaches_ledger() {
        let journal = Arc::new(SlowAckJournal {
            inner: InMemoryJournal::new(),
        });
        let (engine, event_id) = engine_with_event(5, journal.clone()).await;
        engine
            .request_booking(request(event_id, Some(purchaser("Alice")), 2))
            .await
            .unwrap();
        let mut rx = engine.subscribe();

        // The client goes away while the append is awaiting its acknowledgement.
        let pending = engine.request_booking(request(event_id, Some(purchaser("Bob")), 1));
        let dropped = tokio::select! {
            biased;
            _ = pending => false,
            _ = std::future::ready(()) => true,
        };
        assert!(dropped);

        let note = rx.recv().await.unwrap();
        assert_eq!(note.available_tickets, 2);

        assert_eq!(journal.load_event(event_id).await.unwrap().len(), 2);
        assert_eq!(engine.list_bookings(event_id).await.unwrap().len(), 2);
        assert_eq!(engine.available_tickets(event_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_timestamp_matches_booking() {
        let (engine, event_id) = engine_with_event(3, Arc::new(InMemoryJournal::new())).await;
        let mut rx = engine.subscribe();

        let admission = engine
            .request_booking(request(event_id, Some(purchaser("Alice")), 1))
            .await
            .unwrap();
        let note = rx.recv().await.unwrap();
        assert_eq!(note.booking_id, admission.booking.id);
        assert_eq!(note.admitted_at, admission.booking.created_at.timestamp());
    }
}
