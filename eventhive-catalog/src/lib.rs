pub mod demo;
pub mod draft;
pub mod store;

pub use draft::EventDraft;
pub use store::{CatalogError, CatalogStore, InMemoryCatalog};
