//! Hosted search engine REST client

use std::collections::HashMap;

use meilisearch_sdk::{client::Client, search::Selectors};
use serde::de::DeserializeOwned;

use crate::config::Config;

/// Parameters of an index search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub q: String,
    pub limit: usize,
    pub offset: usize,
    pub filter: Option<String>,
    pub facets: Vec<String>,
}

impl SearchRequest {
    pub fn new(q: &str, limit: usize) -> Self {
        Self {
            q: q.trim().to_string(),
            limit,
            ..Default::default()
        }
    }

    /// Restrict `attribute` to any of `values`, ANDed with earlier filters.
    /// An empty value list adds nothing.
    pub fn attribute_filter<I, S>(mut self, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|v| format!("\"{}\"", escape(v.as_ref())))
            .collect();
        if quoted.is_empty() {
            return self;
        }

        let clause = format!("{} IN [{}]", attribute, quoted.join(", "));
        self.filter = Some(match self.filter.take() {
            Some(existing) => format!("{} AND {}", existing, clause),
            None => clause,
        });
        self
    }

    /// Ask the engine for value counts over `attributes`
    pub fn with_facets<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets.extend(attributes.into_iter().map(Into::into));
        self
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Hits plus the engine's estimate of all matches
#[derive(Debug, Clone)]
pub struct SearchResults<T> {
    pub hits: Vec<T>,
    pub estimated_total_hits: Option<u64>,
    pub facet_distribution: Option<HashMap<String, HashMap<String, u64>>>,
    pub processing_time_ms: u64,
}

/// Search engine client using a search-only API key
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
}

impl SearchClient {
    pub fn new(config: &Config) -> Result<Self, SearchError> {
        let client = Client::new(
            config.search_url.trim_end_matches('/'),
            Some(config.search_api_key.as_str()),
        )?;
        Ok(Self { client })
    }

    /// Run `request` against `index`
    pub async fn search<T>(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResults<T>, SearchError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let index = self.client.index(index);
        let facets: Vec<&str> = request.facets.iter().map(String::as_str).collect();

        let mut query = index.search();
        query
            .with_query(&request.q)
            .with_limit(request.limit)
            .with_offset(request.offset);
        if let Some(filter) = request.filter.as_deref() {
            query.with_filter(filter);
        }
        if !facets.is_empty() {
            query.with_facets(Selectors::Some(&facets));
        }

        let results = query.execute::<T>().await?;

        Ok(SearchResults {
            hits: results.hits.into_iter().map(|hit| hit.result).collect(),
            estimated_total_hits: results.estimated_total_hits.map(|n| n as u64),
            facet_distribution: results.facet_distribution.map(|distribution| {
                distribution
                    .into_iter()
                    .map(|(attribute, counts)| {
                        let counts = counts.into_iter().map(|(v, n)| (v, n as u64)).collect();
                        (attribute, counts)
                    })
                    .collect()
            }),
            processing_time_ms: results.processing_time_ms as u64,
        })
    }
}

/// Search engine errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search engine request failed: {0}")]
    Engine(#[from] meilisearch_sdk::errors::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::path::PathBuf;

    #[derive(Debug, Deserialize)]
    struct Hit {
        title: String,
    }

    fn client(server: &MockServer) -> SearchClient {
        let config = Config::for_tests("http://unused", &server.base_url(), PathBuf::from("unused"));
        SearchClient::new(&config).unwrap()
    }

    #[test]
    fn filters_are_anded_and_escaped() {
        let request = SearchRequest::new("  cafe ", 50)
            .attribute_filter("country", ["Mexico", "Costa \"Rica\""])
            .attribute_filter("category", Vec::<String>::new())
            .attribute_filter("source", ["Expo"]);

        assert_eq!(request.q, "cafe");
        assert_eq!(
            request.filter.as_deref(),
            Some(r#"country IN ["Mexico", "Costa \"Rica\""] AND source IN ["Expo"]"#)
        );
    }

    #[test]
    fn facets_are_appended() {
        let request = SearchRequest::new("  cafe ", 50)
            .with_facets(["country"])
            .with_facets(["category"]);
        assert_eq!(request.q, "cafe");
        assert_eq!(request.facets, vec!["country", "category"]);
        assert_eq!(request.filter, None);
    }

    #[tokio::test]
    async fn search_returns_hits_and_estimate() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/indexes/products/search")
                .header("Authorization", "Bearer search-key")
                .json_body_partial(r#"{ "q": "alpaca", "limit": 10 }"#);
            then.status(200).json_body(json!({
                "hits": [{ "title": "Alpaca scarf" }, { "title": "Alpaca blanket" }],
                "query": "alpaca",
                "estimatedTotalHits": 42,
                "processingTimeMs": 3
            }));
        });

        let results: SearchResults<Hit> = client(&server)
            .search("products", &SearchRequest::new("alpaca", 10))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].title, "Alpaca scarf");
        assert_eq!(results.estimated_total_hits, Some(42));
        assert_eq!(results.processing_time_ms, 3);
        assert!(results.facet_distribution.is_none());
    }

    #[tokio::test]
    async fn filter_and_facets_reach_the_engine() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/indexes/products/search")
                .json_body_partial(
                    r#"{ "filter": "country IN [\"Peru\"]", "facets": ["country"] }"#,
                );
            then.status(200).json_body(json!({
                "hits": [],
                "query": "",
                "processingTimeMs": 1,
                "facetDistribution": { "country": { "Peru": 7 } }
            }));
        });

        let request = SearchRequest::new("", 5)
            .attribute_filter("country", ["Peru"])
            .with_facets(["country"]);
        let results: SearchResults<Hit> = client(&server).search("products", &request).await.unwrap();

        mock.assert();
        assert_eq!(results.facet_distribution.unwrap()["country"]["Peru"], 7);
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/indexes/suppliers/search");
            then.status(401).json_body(json!({
                "message": "The provided API key is invalid.",
                "code": "invalid_api_key",
                "type": "auth",
                "link": "https://docs.meilisearch.com/errors#invalid_api_key"
            }));
        });

        let err = client(&server)
            .search::<Hit>("suppliers", &SearchRequest::new("x", 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SearchError::Engine(meilisearch_sdk::errors::Error::Meilisearch(_))
        ));
    }
}
