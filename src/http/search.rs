//! Search endpoint: hosted index query plus local facets, sorting and paging

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::Query;
use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::app::AppState;
use crate::catalog::{build_listing, suggest_keywords, Facet, Faceted, Listing, Sortable};
use crate::http::error::AppError;
use crate::http::middleware::optional_user;
use crate::http::routes::ListingParams;
use crate::http::session::session_id;
use crate::search::{
    facet_attribute, index_for, ProductHit, SearchRequest, SearchText, SupplierHit,
};
use crate::session::{Preferences, SearchMode};
use crate::util::time::Timer;

/// Related keywords returned with each search
const SUGGESTION_LIMIT: usize = 6;

#[derive(Serialize)]
struct SearchResponse<T> {
    query: String,
    mode: SearchMode,
    estimated_total_hits: Option<u64>,
    /// Engine-side counts over every match, not just the fetched hits
    index_facets: Option<HashMap<String, HashMap<String, u64>>>,
    suggestions: Vec<String>,
    #[serde(flatten)]
    listing: Listing<T>,
}

pub async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    state
        .search_limiter
        .check()
        .map_err(|_| AppError::TooManyRequests)?;

    let session = session_id(&headers);
    let mode = match (params.mode, session.as_deref()) {
        (Some(mode), Some(session)) => {
            state
                .sessions
                .set_preferences(session, Preferences { search_mode: mode });
            mode
        }
        (Some(mode), None) => mode,
        (None, Some(session)) => state.sessions.preferences(session).search_mode,
        (None, None) => SearchMode::default(),
    };

    match mode {
        SearchMode::Products => run_search::<ProductHit>(&state, &headers, &params, mode)
            .await
            .map(|r| Json(r).into_response()),
        SearchMode::Suppliers => run_search::<SupplierHit>(&state, &headers, &params, mode)
            .await
            .map(|r| Json(r).into_response()),
    }
}

async fn run_search<T>(
    state: &AppState,
    headers: &HeaderMap,
    params: &ListingParams,
    mode: SearchMode,
) -> Result<SearchResponse<T>, AppError>
where
    T: DeserializeOwned + Serialize + Faceted + Sortable + SearchText + Clone + Send + Sync + 'static,
{
    let user_id = optional_user(headers, &state.config.supabase_jwt_secret);
    let index = index_for(mode);
    let mut request = SearchRequest::new(&params.q, state.config.search_result_limit);
    if mode == SearchMode::Products {
        request = request
            .attribute_filter("supplier_id", params.within_supplier.as_deref())
            .with_facets(Facet::ALL.iter().map(|f| facet_attribute(*f)));
    }

    let timer = Timer::new();
    let results = state
        .search
        .search::<T>(index, &request)
        .await
        .map_err(|e| state.upstream_failure("search", e, user_id))?;

    debug!(
        index,
        query = %request.q,
        hits = results.hits.len(),
        elapsed_ms = timer.elapsed_ms(),
        "Search completed"
    );

    state
        .error_log
        .log_search(&request.q, index, results.hits.len(), user_id);

    let texts: Vec<String> = results.hits.iter().map(SearchText::search_text).collect();
    let suggestions = suggest_keywords(
        &request.q,
        texts.iter().map(String::as_str),
        SUGGESTION_LIMIT,
    );

    let listing = build_listing(results.hits, &params.options(state.config.page_size));

    Ok(SearchResponse {
        query: request.q,
        mode,
        estimated_total_hits: results.estimated_total_hits,
        index_facets: results.facet_distribution,
        suggestions,
        listing,
    })
}
