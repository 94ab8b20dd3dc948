//! Remote error and search logging
//!
//! Both logs are fire-and-forget: rows are written from a spawned task and a
//! failed write only produces a local warning.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::supabase::{SupabaseClient, ERROR_LOGS, SEARCH_QUERIES_LOG};

#[derive(Debug, Clone, Serialize)]
struct ErrorLogRow {
    context: String,
    message: String,
    user_id: Option<Uuid>,
    occurred_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct SearchLogRow {
    query: String,
    index_name: String,
    results_count: usize,
    user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ErrorLogger {
    client: SupabaseClient,
}

impl ErrorLogger {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Record an error in `error_logs` without waiting for the write
    pub fn report(&self, context: &str, message: &str, user_id: Option<Uuid>) {
        let row = ErrorLogRow {
            context: context.to_string(),
            message: message.to_string(),
            user_id,
            occurred_at: chrono::Utc::now(),
        };
        self.spawn_insert(ERROR_LOGS, row);
    }

    /// Record a search in `search_queries_log` without waiting for the write
    pub fn log_search(&self, query: &str, index: &str, results_count: usize, user_id: Option<Uuid>) {
        if query.trim().is_empty() {
            return;
        }

        let row = SearchLogRow {
            query: query.trim().to_string(),
            index_name: index.to_string(),
            results_count,
            user_id,
        };
        self.spawn_insert(SEARCH_QUERIES_LOG, row);
    }

    fn spawn_insert<T: Serialize + Send + Sync + 'static>(&self, table: &'static str, row: T) {
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.insert_minimal(table, &row).await {
                warn!(table, error = %e, "Failed to write remote log row");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn logger(server: &MockServer) -> ErrorLogger {
        let config = Config::for_tests(&server.base_url(), "http://unused", PathBuf::from("unused"));
        ErrorLogger::new(SupabaseClient::new(&config))
    }

    async fn wait_for_hits(mock: &httpmock::Mock<'_>, hits: usize) {
        for _ in 0..50 {
            if mock.hits() >= hits {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn report_writes_error_row() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/error_logs")
                .body_contains("\"context\":\"search\"")
                .body_contains("\"message\":\"timeout\"");
            then.status(201);
        });

        logger(&server).report("search", "timeout", None);
        wait_for_hits(&mock, 1).await;
        mock.assert();
    }

    #[tokio::test]
    async fn failed_log_write_is_swallowed() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/search_queries_log");
            then.status(500);
        });

        logger(&server).log_search("quinoa", "products", 3, None);
        wait_for_hits(&mock, 1).await;
        mock.assert();
    }

    #[tokio::test]
    async fn blank_searches_are_not_logged() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/search_queries_log");
            then.status(201);
        });

        logger(&server).log_search("   ", "products", 0, None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(mock.hits(), 0);
    }
}
