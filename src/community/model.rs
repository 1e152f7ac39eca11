use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Community {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "id")]
    pub external_id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub members: Vec<ObjectId>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Community {
    #[cfg(test)]
    pub fn new(external_id: &str, username: &str, name: &str) -> Self {
        Community {
            id: ObjectId::new(),
            external_id: external_id.to_string(),
            username: username.to_string(),
            name: name.to_string(),
            image: None,
            bio: None,
            created_by: None,
            threads: Vec::new(),
            members: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommunitySummary {
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<&Community> for CommunitySummary {
    fn from(community: &Community) -> Self {
        Self {
            object_id: community.id.to_hex(),
            id: community.external_id.clone(),
            name: community.name.clone(),
            image: community.image.clone(),
        }
    }
}
