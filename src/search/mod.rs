//! Hosted search integration: index names and hit documents

pub mod client;

pub use client::{SearchClient, SearchError, SearchRequest, SearchResults};

use serde::{Deserialize, Serialize};

use crate::catalog::{Facet, Faceted, SortKey, Sortable};
use crate::session::SearchMode;
use crate::util::ids;

pub const PRODUCTS_INDEX: &str = "products";
pub const SUPPLIERS_INDEX: &str = "suppliers";

/// Attribute holding each facet in the indexed documents
pub fn facet_attribute(facet: Facet) -> &'static str {
    match facet {
        Facet::Category => "category",
        Facet::Supplier => "supplier",
        Facet::Source => "source",
        Facet::Country => "country",
    }
}

pub fn index_for(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Products => PRODUCTS_INDEX,
        SearchMode::Suppliers => SUPPLIERS_INDEX,
    }
}

/// Document in the `products` index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHit {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub moq: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "ids::opt_id")]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Faceted for ProductHit {
    fn facet_value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Category => self.category.as_deref(),
            Facet::Supplier => self.supplier.as_deref(),
            Facet::Source => self.source.as_deref(),
            Facet::Country => self.country.as_deref(),
        }
    }
}

impl Sortable for ProductHit {
    fn sort_field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::Title => Some(&self.title),
            SortKey::Price => self.price.as_deref(),
            SortKey::Moq => self.moq.as_deref(),
            SortKey::Supplier => self.supplier.as_deref(),
            SortKey::Country => self.country.as_deref(),
            SortKey::Relevance => None,
        }
    }
}

/// Document in the `suppliers` index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierHit {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Faceted for SupplierHit {
    fn facet_value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Category => self.category.as_deref(),
            Facet::Supplier => Some(&self.title),
            Facet::Source => self.source.as_deref(),
            Facet::Country => self.country.as_deref(),
        }
    }
}

impl Sortable for SupplierHit {
    fn sort_field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::Title | SortKey::Supplier => Some(&self.title),
            SortKey::Country => self.country.as_deref(),
            SortKey::Price | SortKey::Moq | SortKey::Relevance => None,
        }
    }
}

/// Free text scanned for keyword suggestions
pub trait SearchText {
    fn search_text(&self) -> String;
}

impl SearchText for ProductHit {
    fn search_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }
}

impl SearchText for SupplierHit {
    fn search_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }
}
