//! Saved products, unique per (user, product)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{Conflict, Query, SupabaseClient, SupabaseError, SAVED_ITEMS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub user_id: Uuid,
    #[serde(deserialize_with = "crate::util::ids::id")]
    pub product_id: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
struct NewSavedItem<'a> {
    user_id: Uuid,
    product_id: &'a str,
}

/// Saved item store operations
#[derive(Clone)]
pub struct SavedItemStore {
    client: SupabaseClient,
}

impl SavedItemStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Saved items, newest first
    pub async fn list_saved(&self, user_id: Uuid) -> Result<Vec<SavedItem>, SupabaseError> {
        let query = Query::new()
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", false);
        self.client.get(SAVED_ITEMS, &query).await
    }

    pub async fn is_saved(&self, user_id: Uuid, product_id: &str) -> Result<bool, SupabaseError> {
        let query = Query::new()
            .select("product_id")
            .eq("user_id", user_id)
            .eq("product_id", product_id)
            .limit(1);
        let rows: Vec<serde_json::Value> = self.client.get(SAVED_ITEMS, &query).await?;
        Ok(!rows.is_empty())
    }

    /// Save a product; saving it again is a no-op
    pub async fn save(&self, user_id: Uuid, product_id: &str) -> Result<(), SupabaseError> {
        let row = NewSavedItem {
            user_id,
            product_id,
        };
        self.client
            .upsert(SAVED_ITEMS, &row, "user_id,product_id", Conflict::Ignore)
            .await
    }

    pub async fn unsave(&self, user_id: Uuid, product_id: &str) -> Result<(), SupabaseError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("product_id", product_id);
        self.client.delete(SAVED_ITEMS, &query).await
    }
}
