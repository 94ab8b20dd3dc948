//! Application state shared across routes

use std::fmt::Display;
use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::config::Config;
use crate::http::error::{AppError, GENERIC_FAILURE};
use crate::search::{SearchClient, SearchError};
use crate::session::SessionStore;
use crate::store::{
    CatalogStore, ContactStore, ErrorLogger, ProfileStore, SavedItemStore, SupabaseClient,
};
use crate::tariff::TariffSchedule;
use crate::util::rate_limit::{create_limiter, Limiter, SEARCH_RATE_LIMIT};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogStore,
    pub profiles: ProfileStore,
    pub saved: SavedItemStore,
    pub contacts: ContactStore,
    pub error_log: ErrorLogger,
    pub search: SearchClient,
    pub search_limiter: Arc<Limiter>,
    pub cache: Arc<QueryCache>,
    pub sessions: Arc<SessionStore>,
    pub tariffs: Arc<TariffSchedule>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, SearchError> {
        let config = Arc::new(config);

        // Initialize Supabase client
        let supabase = SupabaseClient::new(&config);

        // Initialize stores
        let catalog = CatalogStore::new(supabase.clone());
        let profiles = ProfileStore::new(supabase.clone());
        let saved = SavedItemStore::new(supabase.clone());
        let contacts = ContactStore::new(supabase.clone());
        let error_log = ErrorLogger::new(supabase);

        // Initialize search
        let search = SearchClient::new(&config)?;
        let search_limiter = create_limiter(SEARCH_RATE_LIMIT);

        // Rehydrate the query cache from disk
        let cache = Arc::new(QueryCache::load(&config.cache_path, config.cache_ttl));

        Ok(Self {
            config,
            catalog,
            profiles,
            saved,
            contacts,
            error_log,
            search,
            search_limiter,
            cache,
            sessions: Arc::new(SessionStore::new()),
            tariffs: Arc::new(TariffSchedule::default()),
        })
    }

    /// Log an upstream failure locally and remotely, and hide its details
    /// from the caller
    pub fn upstream_failure(
        &self,
        context: &str,
        err: impl Display,
        user_id: Option<Uuid>,
    ) -> AppError {
        let message = err.to_string();
        error!(context, user_id = ?user_id, error = %message, "Upstream request failed");
        self.error_log.report(context, &message, user_id);
        AppError::Internal(GENERIC_FAILURE.to_string())
    }
}
