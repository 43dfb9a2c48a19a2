//! Prefsync Service - contract with the remote preference store
//!
//! Two operations, nothing more:
//! - `fetch` the full authoritative set
//! - `write` a partial set with merge-by-key semantics
//!
//! Backends:
//! - [`HttpPreferencesService`] talks to the REST API
//! - [`InMemoryPreferencesService`] keeps the set in process, with failure
//!   injection for simulations and tests

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod service;

pub use config::ClientConfig;
pub use error::{ConfigError, FetchError, ServiceError, WriteError};
pub use http::HttpPreferencesService;
pub use memory::InMemoryPreferencesService;
pub use service::{Ack, PreferencesService};

#[cfg(any(test, feature = "mock"))]
pub use service::MockPreferencesService;

#[cfg(test)]
mod mock_tests {
    use super::*;
    use prefsync_model::{PreferenceKey, PreferenceSet};

    #[tokio::test]
    async fn mock_service_is_usable_as_trait_object() {
        let mut mock = MockPreferencesService::new();
        mock.expect_fetch()
            .times(1)
            .returning(|| Ok(PreferenceSet::new().with(PreferenceKey::EnablePmReports, true)));

        let service: Box<dyn PreferencesService> = Box::new(mock);
        let set = service.fetch().await.unwrap();
        assert_eq!(set.get(PreferenceKey::EnablePmReports), Some(true));
    }
}
