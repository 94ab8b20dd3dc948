//! Read-only catalog tables: products, suppliers and their lookups

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::supabase::{
    Query, SupabaseClient, SupabaseError, CATEGORIES, COUNTRIES, PRODUCTS, SOURCES, SUPPLIERS,
};
use crate::catalog::{Facet, Faceted, SortKey, Sortable};
use crate::util::ids;

/// Product columns plus the display names of its related rows, embedded
/// through the foreign keys
pub const PRODUCT_COLUMNS: &str = "*,\
category:Categories(title:Category_Name),\
supplier:Supplier(title:Supplier_Title),\
source:Sources(title:Source_Title),\
country:Countries(title:Country_Title)";

/// Display name of an embedded related row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub title: String,
}

/// Row of the `Products` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "Product_ID", deserialize_with = "ids::id")]
    pub id: String,
    #[serde(rename = "Product_Title")]
    pub title: String,
    #[serde(rename = "Product_Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Product_Price", default)]
    pub price: Option<String>,
    #[serde(rename = "Product_MOQ", default)]
    pub moq: Option<String>,
    #[serde(rename = "Product_Image_URL", default)]
    pub image_url: Option<String>,
    #[serde(rename = "Product_URL", default)]
    pub url: Option<String>,
    #[serde(rename = "Product_Category_ID", default, deserialize_with = "ids::opt_id")]
    pub category_id: Option<String>,
    #[serde(rename = "Product_Supplier_ID", default, deserialize_with = "ids::opt_id")]
    pub supplier_id: Option<String>,
    #[serde(rename = "Product_Source_ID", default, deserialize_with = "ids::opt_id")]
    pub source_id: Option<String>,
    #[serde(rename = "Product_Country_ID", default, deserialize_with = "ids::opt_id")]
    pub country_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Label>,
}

/// Embedded name, or the raw id when the related row is missing
fn label_or_id<'a>(label: &'a Option<Label>, id: &'a Option<String>) -> Option<&'a str> {
    label
        .as_ref()
        .map(|l| l.title.as_str())
        .or(id.as_deref())
}

/// Facets are display names, matching the search index documents
impl Faceted for Product {
    fn facet_value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Category => label_or_id(&self.category, &self.category_id),
            Facet::Supplier => label_or_id(&self.supplier, &self.supplier_id),
            Facet::Source => label_or_id(&self.source, &self.source_id),
            Facet::Country => label_or_id(&self.country, &self.country_id),
        }
    }
}

impl Sortable for Product {
    fn sort_field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::Title => Some(&self.title),
            SortKey::Price => self.price.as_deref(),
            SortKey::Moq => self.moq.as_deref(),
            SortKey::Supplier => self.supplier.as_ref().map(|l| l.title.as_str()),
            SortKey::Country => self.country.as_ref().map(|l| l.title.as_str()),
            SortKey::Relevance => None,
        }
    }
}

/// Row of the `Supplier` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(rename = "Supplier_ID", deserialize_with = "ids::id")]
    pub id: String,
    #[serde(rename = "Supplier_Title")]
    pub title: String,
    #[serde(rename = "Supplier_Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Supplier_Website", default)]
    pub website: Option<String>,
    #[serde(rename = "Supplier_Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Supplier_Logo", default)]
    pub logo_url: Option<String>,
    #[serde(rename = "Supplier_City", default)]
    pub city: Option<String>,
    #[serde(rename = "Supplier_Country_ID", default, deserialize_with = "ids::opt_id")]
    pub country_id: Option<String>,
    #[serde(rename = "Supplier_Source_ID", default, deserialize_with = "ids::opt_id")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "Category_ID", deserialize_with = "ids::id")]
    pub id: String,
    #[serde(rename = "Category_Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "Source_ID", deserialize_with = "ids::id")]
    pub id: String,
    #[serde(rename = "Source_Title")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(rename = "Country_ID", deserialize_with = "ids::id")]
    pub id: String,
    #[serde(rename = "Country_Title")]
    pub title: String,
}

/// Product column used to browse by facet
pub fn product_column(facet: Facet) -> &'static str {
    match facet {
        Facet::Category => "Product_Category_ID",
        Facet::Supplier => "Product_Supplier_ID",
        Facet::Source => "Product_Source_ID",
        Facet::Country => "Product_Country_ID",
    }
}

/// Catalog store operations
#[derive(Clone)]
pub struct CatalogStore {
    client: SupabaseClient,
}

impl CatalogStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// One page of products ordered by title, with the table's total row count
    pub async fn list_products(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<Product>, Option<u64>), SupabaseError> {
        let page_size = page_size.max(1);
        let from = page.max(1).saturating_sub(1).saturating_mul(page_size);
        let query = Query::new()
            .select(PRODUCT_COLUMNS)
            .order("Product_Title", true)
            .range(from, from.saturating_add(page_size - 1));
        self.client.get_with_count(PRODUCTS, &query).await
    }

    /// Up to `limit` products for in-memory faceting
    pub async fn all_products(&self, limit: usize) -> Result<Vec<Product>, SupabaseError> {
        let query = Query::new()
            .select(PRODUCT_COLUMNS)
            .order("Product_Title", true)
            .limit(limit);
        self.client.get(PRODUCTS, &query).await
    }

    /// Products sharing a category, supplier, source or country
    pub async fn products_by(
        &self,
        facet: Facet,
        value: &str,
        limit: usize,
    ) -> Result<Vec<Product>, SupabaseError> {
        let query = Query::new()
            .select(PRODUCT_COLUMNS)
            .eq(product_column(facet), value)
            .order("Product_Title", true)
            .limit(limit);
        self.client.get(PRODUCTS, &query).await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Option<Product>, SupabaseError> {
        let query = Query::new().select(PRODUCT_COLUMNS).eq("Product_ID", product_id);
        self.client.get_one(PRODUCTS, &query).await
    }

    /// Bump the view counter; failures only get logged
    pub async fn record_product_view(&self, product_id: &str) {
        #[derive(Serialize)]
        struct Args<'a> {
            product_id: &'a str,
        }

        let result: Result<serde_json::Value, _> = self
            .client
            .rpc("increment_product_views", &Args { product_id })
            .await;

        if let Err(e) = result {
            warn!(product_id, error = %e, "Failed to record product view");
        }
    }

    /// Products for a list of ids, in title order
    pub async fn products_by_ids(&self, product_ids: &[&str]) -> Result<Vec<Product>, SupabaseError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new()
            .select(PRODUCT_COLUMNS)
            .in_list("Product_ID", product_ids)
            .order("Product_Title", true);
        self.client.get(PRODUCTS, &query).await
    }

    pub async fn get_supplier(&self, supplier_id: &str) -> Result<Option<Supplier>, SupabaseError> {
        let query = Query::new().select("*").eq("Supplier_ID", supplier_id);
        self.client.get_one(SUPPLIERS, &query).await
    }

    pub async fn list_suppliers(&self, limit: usize) -> Result<Vec<Supplier>, SupabaseError> {
        let query = Query::new()
            .select("*")
            .order("Supplier_Title", true)
            .limit(limit);
        self.client.get(SUPPLIERS, &query).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, SupabaseError> {
        let query = Query::new().select("*").order("Category_Name", true);
        self.client.get(CATEGORIES, &query).await
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>, SupabaseError> {
        let query = Query::new().select("*").order("Source_Title", true);
        self.client.get(SOURCES, &query).await
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>, SupabaseError> {
        let query = Query::new().select("*").order("Country_Title", true);
        self.client.get(COUNTRIES, &query).await
    }
}
