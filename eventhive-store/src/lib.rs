pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod identity_repo;

pub use booking_repo::PgBookingJournal;
pub use catalog_repo::PgCatalogStore;
pub use database::DbClient;
pub use identity_repo::PgIdentityProvider;
