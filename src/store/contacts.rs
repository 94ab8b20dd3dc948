//! Supplier contact requests and the buyer's contact history

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{Query, SupabaseClient, SupabaseError, MEMBER_MESSAGES};
use crate::util::ids;

/// Contact form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub supplier_id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct MessageRow<'a> {
    sender_id: Uuid,
    supplier_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
}

/// Row of `member_messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub sender_id: Uuid,
    #[serde(deserialize_with = "ids::id")]
    pub supplier_id: String,
    #[serde(default, deserialize_with = "ids::opt_id")]
    pub product_id: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Contact store operations
#[derive(Clone)]
pub struct ContactStore {
    client: SupabaseClient,
}

impl ContactStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Record a message to a supplier. Field validation happens before this.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        contact: &NewContact,
    ) -> Result<ContactMessage, SupabaseError> {
        let row = MessageRow {
            sender_id: user_id,
            supplier_id: contact.supplier_id.trim(),
            product_id: contact.product_id.as_deref(),
            subject: contact.subject.trim(),
            message: contact.message.trim(),
        };
        self.client.insert(MEMBER_MESSAGES, &row).await
    }

    /// Messages sent by the user, newest first
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<ContactMessage>, SupabaseError> {
        let query = Query::new()
            .select("*")
            .eq("sender_id", user_id)
            .order("created_at", false);
        self.client.get(MEMBER_MESSAGES, &query).await
    }
}
