use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::pagination::SortOrder;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Identity issued by the authentication provider.
    #[serde(rename = "id")]
    pub external_id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub onboarded: bool,
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub communities: Vec<ObjectId>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Fields written by an onboarding or profile edit.
#[derive(Debug, Clone)]
pub struct UserProfileUpdate {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// Filter shared by the user listing and its count query.
#[derive(Debug, Clone)]
pub struct UserSearch {
    pub exclude_id: String,
    /// Trimmed, non-empty search text. Matched literally and case-insensitively.
    pub text: Option<String>,
    pub sort_by: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            object_id: user.id.to_hex(),
            id: user.external_id.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub onboarded: bool,
    pub threads: Vec<String>,
    pub communities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            object_id: user.id.to_hex(),
            id: user.external_id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            bio: user.bio.clone(),
            onboarded: user.onboarded,
            threads: user.threads.iter().map(|id| id.to_hex()).collect(),
            communities: user.communities.iter().map(|id| id.to_hex()).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    /// Page the edit was made from, used for cache revalidation.
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchUsersQuery {
    pub search_string: Option<String>,
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    pub sort_by: Option<SortOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_documents_store_dates_as_bson_dates() {
        let thread = ObjectId::new();
        let user = User {
            id: ObjectId::new(),
            external_id: "user_1".into(),
            username: "ada".into(),
            name: "Ada".into(),
            image: None,
            bio: None,
            onboarded: true,
            threads: vec![thread],
            communities: Vec::new(),
            created_at: Utc::now(),
        };

        let doc = bson::to_document(&user).unwrap();
        assert!(matches!(doc.get("created_at"), Some(bson::Bson::DateTime(_))));
        assert_eq!(doc.get_str("id").unwrap(), "user_1");

        let view = UserView::from(&bson::from_document::<User>(doc).unwrap());
        assert_eq!(view.threads, vec![thread.to_hex()]);
        assert!(view.communities.is_empty());
    }
}
