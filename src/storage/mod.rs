//! Service backends

#[cfg(feature = "google")]
pub mod google;
pub mod in_memory;

#[cfg(feature = "google")]
pub use google::GoogleConnector;
pub use in_memory::{BackendCall, InMemoryBackend, StoredObject};
