//! Supabase REST API client using service_role key

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

pub const PRODUCTS: &str = "Products";
pub const SUPPLIERS: &str = "Supplier";
pub const CATEGORIES: &str = "Categories";
pub const SOURCES: &str = "Sources";
pub const COUNTRIES: &str = "Countries";
pub const USER_PROFILES: &str = "user_profiles";
pub const SAVED_ITEMS: &str = "saved_items";
pub const MEMBER_MESSAGES: &str = "member_messages";
pub const MEMBERS: &str = "members";
pub const ERROR_LOGS: &str = "error_logs";
pub const SEARCH_QUERIES_LOG: &str = "search_queries_log";

/// PostgREST query parameters
///
/// Filters become `column=op.value` pairs; `range` is inclusive on both ends
/// and is sent as `offset`/`limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn in_list<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|v| format!("\"{}\"", v.as_ref().replace('"', "\\\"")))
            .collect();
        self.params
            .push((column.to_string(), format!("in.({})", quoted.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, dir)));
        self
    }

    pub fn range(mut self, from: usize, to: usize) -> Self {
        let limit = to.saturating_sub(from) + 1;
        self.params.push(("offset".to_string(), from.to_string()));
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// How an upsert treats a row that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Ignore,
    Merge,
}

impl Conflict {
    fn prefer(self) -> &'static str {
        match self {
            Conflict::Ignore => "resolution=ignore-duplicates,return=minimal",
            Conflict::Merge => "resolution=merge-duplicates,return=minimal",
        }
    }
}

/// Supabase client for server-side database operations
/// Uses service_role key which bypasses RLS - handle with care!
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = self
            .authed(self.client.get(self.rest_url(table)))
            .query(query.params())
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = check(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// GET with an exact row count taken from the `Content-Range` header
    pub async fn get_with_count<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<(Vec<T>, Option<u64>), SupabaseError> {
        let response = self
            .authed(self.client.get(self.rest_url(table)))
            .header("Prefer", "count=exact")
            .query(query.params())
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = check(response).await?;
        let total = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows = response.json().await.map_err(SupabaseError::Parse)?;
        Ok((rows, total))
    }

    /// Make an authenticated GET request expecting a single row
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Option<T>, SupabaseError> {
        let response = self
            .authed(self.client.get(self.rest_url(table)))
            .header("Accept", "application/vnd.pgrst.object+json")
            .query(query.params())
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        if response.status() == StatusCode::NOT_ACCEPTABLE {
            // No rows found
            return Ok(None);
        }

        let response = check(response).await?;
        response.json().await.map(Some).map_err(SupabaseError::Parse)
    }

    /// Make an authenticated POST request (insert)
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let response = self
            .authed(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = check(response).await?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// Insert without reading the row back
    pub async fn insert_minimal<T: Serialize>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<(), SupabaseError> {
        let response = self
            .authed(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=minimal")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        check(response).await.map(|_| ())
    }

    /// Upsert on the given conflict columns
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        data: &T,
        on_conflict: &str,
        conflict: Conflict,
    ) -> Result<(), SupabaseError> {
        let query = Query::new().on_conflict(on_conflict);

        let response = self
            .authed(self.client.post(self.rest_url(table)))
            .header("Prefer", conflict.prefer())
            .query(query.params())
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        check(response).await.map(|_| ())
    }

    /// Delete the rows matched by `query`
    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), SupabaseError> {
        let response = self
            .authed(self.client.delete(self.rest_url(table)))
            .query(query.params())
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        check(response).await.map(|_| ())
    }

    /// Call a Postgres function exposed under `/rest/v1/rpc`
    pub async fn rpc<A: Serialize, R: DeserializeOwned>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<R, SupabaseError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);

        let response = self
            .authed(self.client.post(&url))
            .json(args)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = check(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }
}

async fn check(response: Response) -> Result<Response, SupabaseError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Total from a `Content-Range` header such as `0-23/154` (`*` means unknown)
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}
