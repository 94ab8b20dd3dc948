//! In-memory listing logic shared by the product and search pages

pub mod facets;
pub mod keywords;
pub mod paginate;
pub mod sort;

pub use facets::{all_facet_counts, filter_records, Facet, FacetCount, FacetSelection, Faceted};
pub use keywords::suggest_keywords;
pub use paginate::{paginate, LoadMore, Page};
pub use sort::{sort_records, SortDirection, SortKey, Sortable};

use std::collections::BTreeMap;

use serde::Serialize;

/// Listing options coming from the page's query string
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    pub selection: FacetSelection,
    pub sort: SortKey,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
    /// Return every record up to `page` instead of only that page
    pub cumulative: bool,
}

/// Facet counts plus the requested page of filtered, sorted records
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub facets: BTreeMap<Facet, Vec<FacetCount>>,
    pub matched: usize,
    #[serde(flatten)]
    pub page: Page<T>,
}

/// Count facets over the full set, then filter, sort and page it
pub fn build_listing<T>(records: Vec<T>, options: &ListingOptions) -> Listing<T>
where
    T: Faceted + Sortable + Clone,
{
    let facets = all_facet_counts(&records);

    let mut filtered = filter_records(&records, &options.selection);
    sort_records(&mut filtered, options.sort, options.direction);

    let mut page = paginate(&filtered, options.page, options.page_size);
    if options.cumulative {
        let mut scroll = LoadMore::new(page.page_size);
        for _ in 1..page.page {
            if !scroll.load_more(filtered.len()) {
                break;
            }
        }
        page.items = filtered[..scroll.visible(filtered.len())].to_vec();
    }

    Listing {
        facets,
        matched: filtered.len(),
        page,
    }
}
