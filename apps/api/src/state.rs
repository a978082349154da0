use crate::db::PgStore;
use crate::enrichment::EnrichmentQueue;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres store. Implements every store trait plus the profile directory.
    pub store: PgStore,
    /// Background enrichment; also exposes the completion client for synchronous helpers.
    pub enrichment: EnrichmentQueue,
}
