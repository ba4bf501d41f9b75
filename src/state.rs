//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the query layer (backed by the in-memory cache) and the auth
//! settings used to sign and verify session cookies.

use std::sync::Arc;

use crate::cache::LocalCache;
use crate::config::AuthConfig;
use crate::db::queries::Queries;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub queries: Queries,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(queries: Queries, auth: AuthConfig) -> Self {
        Self { queries, auth: Arc::new(auth) }
    }

    /// State backed by a fresh, empty `LocalCache`.
    #[must_use]
    pub fn in_memory(auth: AuthConfig) -> Self {
        Self::new(Queries::new(Arc::new(LocalCache::new())), auth)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
