//! Application state.

use std::sync::Arc;

use edumart_core::PlatformSettings;
use edumart_store::{keys, Store, StoreExt};

use crate::config::ServiceConfig;
use crate::error::ApiError;

/// How many times an optimistic write is attempted before answering `busy`.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        if config.gateway_key.is_none() {
            tracing::warn!("GATEWAY_KEY not set - x-user-id is trusted without a gateway check");
        }
        Self { store, config }
    }

    /// Current platform settings, falling back to the configured default.
    pub fn settings(&self) -> Result<PlatformSettings, ApiError> {
        match self.store.fetch::<PlatformSettings>(keys::SETTINGS_KEY)? {
            Some(settings) => Ok(settings),
            None => Ok(PlatformSettings::new(self.config.default_commission_percent)?),
        }
    }

    /// Run a read-modify-write closure, retrying when a compare-and-put lost
    /// against a concurrent writer.
    pub fn transact<T>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt() {
                Err(ApiError::Busy) if tries < MAX_WRITE_ATTEMPTS => {
                    tracing::debug!(operation, attempt = tries, "Stale write, retrying");
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edumart_store::MemoryStore;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), ServiceConfig::default())
    }

    #[test]
    fn transact_retries_stale_writes() {
        let state = state();
        let mut calls = 0;
        let result = state.transact("test", || {
            calls += 1;
            if calls < 3 {
                Err(ApiError::Busy)
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn transact_gives_up() {
        let state = state();
        let mut calls = 0;
        let result: Result<(), _> = state.transact("test", || {
            calls += 1;
            Err(ApiError::Busy)
        });
        assert!(matches!(result, Err(ApiError::Busy)));
        assert_eq!(calls, MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn settings_default_from_config() {
        let state = state();
        assert_eq!(state.settings().unwrap().commission_percent, 20);
    }
}
