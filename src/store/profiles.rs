//! User profile management

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{Conflict, Query, SupabaseClient, SupabaseError, MEMBERS, USER_PROFILES};

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Profile form submitted by the account page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProfileRow<'a> {
    id: Uuid,
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Membership record for registered buyers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Uuid,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Required form fields that are blank
pub fn missing_fields<'a>(fields: &[(&'a str, &str)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

/// Profile store operations
#[derive(Clone)]
pub struct ProfileStore {
    client: SupabaseClient,
}

impl ProfileStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a user profile by ID
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, SupabaseError> {
        let query = Query::new().select("*").eq("id", user_id);
        self.client.get_one(USER_PROFILES, &query).await
    }

    /// Create or overwrite the caller's profile
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), SupabaseError> {
        let row = ProfileRow {
            id: user_id,
            update,
            updated_at: chrono::Utc::now(),
        };
        self.client
            .upsert(USER_PROFILES, &row, "id", Conflict::Merge)
            .await
    }

    pub async fn get_member(&self, user_id: Uuid) -> Result<Option<Member>, SupabaseError> {
        let query = Query::new().select("*").eq("user_id", user_id);
        self.client.get_one(MEMBERS, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn store(server: &MockServer) -> ProfileStore {
        let config = Config::for_tests(&server.base_url(), "http://unused", PathBuf::from("unused"));
        ProfileStore::new(SupabaseClient::new(&config))
    }

    #[test]
    fn blank_required_fields_are_reported() {
        assert_eq!(
            missing_fields(&[("full_name", "  "), ("subject", "Hola"), ("message", "")]),
            vec!["full_name", "message"]
        );
        assert!(missing_fields(&[("full_name", "Ana")]).is_empty());
    }

    #[tokio::test]
    async fn upsert_merges_on_id() {
        let server = MockServer::start();
        let user_id = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/user_profiles")
                .query_param("on_conflict", "id")
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .body_contains("\"full_name\":\"Ana Torres\"");
            then.status(201);
        });

        let update = ProfileUpdate {
            full_name: "Ana Torres".to_string(),
            ..Default::default()
        };
        store(&server).upsert_profile(user_id, &update).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/user_profiles");
            then.status(406).json_body(json!({ "code": "PGRST116" }));
        });

        let profile = store(&server).get_profile(Uuid::new_v4()).await.unwrap();
        assert!(profile.is_none());
    }
}
