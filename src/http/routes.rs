//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, Method},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::catalog::{
    build_listing, paginate, Facet, FacetSelection, Listing, ListingOptions, Page,
    SortDirection, SortKey,
};
use crate::http::account::{
    contact_history_handler, get_profile_handler, is_saved_handler, list_saved_handler,
    save_handler, send_contact_handler, unsave_handler, update_profile_handler,
};
use crate::http::error::AppError;
use crate::http::middleware::require_auth;
use crate::http::search::search_handler;
use crate::http::session::{
    back_handler, get_history_handler, get_preferences_handler, push_history_handler,
    put_preferences_handler, SESSION_HEADER,
};
use crate::http::tariff::{calculate_handler, tariff_categories_handler};
use crate::session::SearchMode;
use crate::store::catalog::{Category, Country, Product, Source, Supplier};
use crate::util::time::uptime_secs;

/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: usize = 100;

/// Highest page number honoured; deeper pages are read as this one
pub const MAX_PAGE: usize = 10_000;

/// Products shown next to a product or supplier page
const RELATED_PRODUCTS: usize = 8;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/products", get(products_handler))
        .route("/products/:id", get(product_handler))
        .route("/suppliers", get(suppliers_handler))
        .route("/suppliers/:id", get(supplier_handler))
        .route("/browse/:facet/:value", get(browse_handler))
        .route("/categories", get(categories_handler))
        .route("/sources", get(sources_handler))
        .route("/countries", get(countries_handler))
        .route("/search", get(search_handler))
        .route("/tariff/categories", get(tariff_categories_handler))
        .route("/tariff/calculate", post(calculate_handler))
        .route("/session/history", get(get_history_handler).post(push_history_handler))
        .route("/session/history/back", post(back_handler))
        .route(
            "/session/preferences",
            get(get_preferences_handler).put(put_preferences_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/saved", get(list_saved_handler).post(save_handler))
        .route(
            "/saved/:product_id",
            get(is_saved_handler).delete(unsave_handler),
        )
        .route("/contacts", get(contact_history_handler).post(send_contact_handler))
        .route("/profile", get(get_profile_handler).put(update_profile_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Listing query parameters
// ============================================================================

/// Query string shared by listing and search pages. Facet values repeat:
/// `?category=Textiles&category=Electronics&country=Mexico`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub mode: Option<SearchMode>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub supplier: Vec<String>,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub dir: SortDirection,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Limit a product search to one supplier's catalog
    #[serde(default)]
    pub within_supplier: Option<String>,
    /// Infinite scroll: return everything up to `page`
    #[serde(default)]
    pub scroll: bool,
}

impl ListingParams {
    pub fn selection(&self) -> FacetSelection {
        FacetSelection::new()
            .with(Facet::Category, self.category.iter().cloned())
            .with(Facet::Supplier, self.supplier.iter().cloned())
            .with(Facet::Source, self.source.iter().cloned())
            .with(Facet::Country, self.country.iter().cloned())
    }

    pub fn options(&self, default_page_size: usize) -> ListingOptions {
        ListingOptions {
            selection: self.selection(),
            sort: self.sort,
            direction: self.dir,
            page: self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            page_size: self
                .page_size
                .unwrap_or(default_page_size)
                .clamp(1, MAX_PAGE_SIZE),
            cumulative: self.scroll,
        }
    }
}

#[derive(Serialize)]
struct CatalogDescriptor<'a> {
    table: &'a str,
    limit: usize,
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    cached_queries: usize,
    active_sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        cached_queries: state.cache.len(),
        active_sessions: state.sessions.session_count(),
    })
}

// ============================================================================
// Catalog endpoints
// ============================================================================

async fn products_handler(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<Product>>, AppError> {
    let options = params.options(state.config.page_size);

    // Plain browsing pages straight from the table
    if options.selection.is_empty() && options.sort == SortKey::Relevance && !options.cumulative {
        let (products, total) = state
            .catalog
            .list_products(options.page, options.page_size)
            .await
            .map_err(|e| state.upstream_failure("list_products", e, None))?;

        let total = total.map(|t| t as usize).unwrap_or(products.len());
        let page = options.page.max(1);
        let has_more = (page - 1)
            .saturating_mul(options.page_size)
            .saturating_add(products.len())
            < total;

        return Ok(Json(Listing {
            facets: Default::default(),
            matched: total,
            page: Page {
                items: products,
                page,
                page_size: options.page_size,
                total,
                total_pages: total.div_ceil(options.page_size),
                has_more,
            },
        }));
    }

    let limit = state.config.search_result_limit;
    let catalog = state.catalog.clone();
    let products: Vec<Product> = state
        .cache
        .get_or_fetch(&CatalogDescriptor { table: "Products", limit }, || async move {
            catalog.all_products(limit).await
        })
        .await
        .map_err(|e| state.upstream_failure("all_products", e, None))?;

    Ok(Json(build_listing(products, &options)))
}

#[derive(Serialize)]
struct ProductResponse {
    product: Product,
    supplier: Option<Supplier>,
    related: Vec<Product>,
}

async fn product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .catalog
        .get_product(&id)
        .await
        .map_err(|e| state.upstream_failure("get_product", e, None))?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let catalog = state.catalog.clone();
    let viewed = product.id.clone();
    tokio::spawn(async move { catalog.record_product_view(&viewed).await });

    let (supplier, related) = match product.supplier_id.as_deref() {
        Some(supplier_id) => futures::try_join!(
            state.catalog.get_supplier(supplier_id),
            state
                .catalog
                .products_by(Facet::Supplier, supplier_id, RELATED_PRODUCTS + 1),
        )
        .map_err(|e| state.upstream_failure("get_product_supplier", e, None))?,
        None => (None, Vec::new()),
    };

    let related = related
        .into_iter()
        .filter(|p| p.id != product.id)
        .take(RELATED_PRODUCTS)
        .collect();

    Ok(Json(ProductResponse {
        product,
        supplier,
        related,
    }))
}

async fn suppliers_handler(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<Supplier>>, AppError> {
    let limit = state.config.search_result_limit;
    let catalog = state.catalog.clone();
    let suppliers: Vec<Supplier> = state
        .cache
        .get_or_fetch(&CatalogDescriptor { table: "Supplier", limit }, || async move {
            catalog.list_suppliers(limit).await
        })
        .await
        .map_err(|e| state.upstream_failure("list_suppliers", e, None))?;

    Ok(Json(page_of(&suppliers, &params, state.config.page_size)))
}

#[derive(Serialize)]
struct SupplierResponse {
    supplier: Supplier,
    #[serde(flatten)]
    products: Listing<Product>,
}

async fn supplier_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<SupplierResponse>, AppError> {
    let limit = state.config.search_result_limit;
    let (supplier, products) = futures::try_join!(
        state.catalog.get_supplier(&id),
        state.catalog.products_by(Facet::Supplier, &id, limit),
    )
    .map_err(|e| state.upstream_failure("get_supplier", e, None))?;

    let supplier = supplier.ok_or_else(|| AppError::NotFound("Supplier not found".to_string()))?;

    Ok(Json(SupplierResponse {
        supplier,
        products: build_listing(products, &params.options(state.config.page_size)),
    }))
}

/// Category, country and source pages
async fn browse_handler(
    State(state): State<AppState>,
    Path((facet, value)): Path<(Facet, String)>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<Product>>, AppError> {
    let products = state
        .catalog
        .products_by(facet, &value, state.config.search_result_limit)
        .await
        .map_err(|e| state.upstream_failure("browse", e, None))?;

    Ok(Json(build_listing(products, &params.options(state.config.page_size))))
}

async fn categories_handler(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let catalog = state.catalog.clone();
    state
        .cache
        .get_or_fetch(&CatalogDescriptor { table: "Categories", limit: 0 }, || async move {
            catalog.list_categories().await
        })
        .await
        .map(Json)
        .map_err(|e| state.upstream_failure("list_categories", e, None))
}

async fn sources_handler(State(state): State<AppState>) -> Result<Json<Vec<Source>>, AppError> {
    let catalog = state.catalog.clone();
    state
        .cache
        .get_or_fetch(&CatalogDescriptor { table: "Sources", limit: 0 }, || async move {
            catalog.list_sources().await
        })
        .await
        .map(Json)
        .map_err(|e| state.upstream_failure("list_sources", e, None))
}

async fn countries_handler(State(state): State<AppState>) -> Result<Json<Vec<Country>>, AppError> {
    let catalog = state.catalog.clone();
    state
        .cache
        .get_or_fetch(&CatalogDescriptor { table: "Countries", limit: 0 }, || async move {
            catalog.list_countries().await
        })
        .await
        .map(Json)
        .map_err(|e| state.upstream_failure("list_countries", e, None))
}

/// Slice used by handlers that page an already-loaded list
pub fn page_of<T: Clone>(items: &[T], params: &ListingParams, default_page_size: usize) -> Page<T> {
    let options = params.options(default_page_size);
    paginate(items, options.page, options.page_size)
}
