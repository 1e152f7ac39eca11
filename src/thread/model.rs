use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::community::model::CommunitySummary;
use crate::user::model::AuthorSummary;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub text: String,
    pub author: ObjectId,
    #[serde(default)]
    pub community: Option<ObjectId>,
    /// Set on replies; top-level threads have none.
    #[serde(default)]
    pub parent_id: Option<ObjectId>,
    #[serde(default)]
    pub children: Vec<ObjectId>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(text: String, author: ObjectId) -> Self {
        Thread {
            id: ObjectId::new(),
            text,
            author,
            community: None,
            parent_id: None,
            children: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn reply_to(parent: &ObjectId, text: String, author: ObjectId) -> Self {
        Thread {
            parent_id: Some(*parent),
            ..Thread::new(text, author)
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A thread with its references resolved.
///
/// `children` holds the populated replies when the operation asks for them
/// and is empty otherwise; `reply_count` always reflects the stored list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub author: Option<AuthorSummary>,
    pub community: Option<CommunitySummary>,
    pub parent_id: Option<String>,
    pub children: Vec<ThreadView>,
    pub reply_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub text: String,
    pub community_id: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchPostsQuery {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
}
