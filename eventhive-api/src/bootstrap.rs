use anyhow::Context;
use eventhive_catalog::{demo::demo_drafts, CatalogStore};
use eventhive_core::{identity::demo_registrations, AdmissionEngine, IdentityProvider};
use eventhive_store::{
    app_config::{Config, StorageBackend},
    DbClient, PgBookingJournal, PgCatalogStore, PgIdentityProvider,
};
use std::sync::Arc;

use crate::{
    metrics::Metrics,
    state::{AppState, AuthConfig},
};

/// Wires the stores selected by `storage.backend` into an [`AppState`].
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(AppState::in_memory(auth)?)
        }
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Using Postgres storage");

            let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(db.pool.clone()));
            let journal = Arc::new(PgBookingJournal::new(db.pool.clone()));
            let identity: Arc<dyn IdentityProvider> = Arc::new(PgIdentityProvider::new(db.pool));

            Ok(AppState {
                engine: Arc::new(AdmissionEngine::new(catalog.clone(), journal)),
                catalog,
                identity,
                metrics: Arc::new(Metrics::new()?),
                auth,
            })
        }
    }
}

/// Registers the demo accounts and gives the demo organizer the demo events.
/// Safe to run on every start: existing accounts and events are left alone.
pub async fn seed_demo(state: &AppState) -> anyhow::Result<()> {
    let mut organizer = None;
    for registration in demo_registrations() {
        let user = match state.identity.resolve(&registration.email).await? {
            Some(user) => user,
            None => state.identity.register(registration).await?,
        };
        if user.is_organizer() {
            organizer = Some(user);
        }
    }

    let Some(organizer) = organizer else {
        return Ok(());
    };
    if !state.catalog.list_by_organizer(organizer.id).await?.is_empty() {
        tracing::debug!("Demo events already present");
        return Ok(());
    }

    for draft in demo_drafts() {
        let event = state.catalog.create_event(organizer.id, draft).await?;
        tracing::info!("Seeded event {} ({})", event.title, event.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    #[tokio::test]
    async fn test_seed_demo_is_idempotent() {
        let state = AppState::in_memory(auth()).unwrap();
        seed_demo(&state).await.unwrap();
        seed_demo(&state).await.unwrap();

        assert_eq!(state.catalog.list_events().await.unwrap().len(), 4);
        let bob = state.identity.resolve("bob@example.com").await.unwrap().unwrap();
        assert!(bob.is_organizer());
        assert!(state.identity.resolve("alice@example.com").await.unwrap().is_some());
    }
}
