use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A user document. `pendingTasks` is the reverse half of the assignment
/// relationship and may drift from the task side until reconciled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// MongoDB document ID.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    /// Stored trimmed and lowercased; unique across the collection.
    pub email: String,
    #[serde(default)]
    pub pending_tasks: Vec<ObjectId>,
    pub date_created: DateTime<Utc>,
}

impl User {
    /// Canonical form used for storage and the uniqueness check.
    pub fn normalize_email(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

/// Body of POST /api/users and PUT /api/users/{id}. `pendingTasks` arrives as
/// hex strings so malformed ids fail validation before any store access.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub pending_tasks: Vec<String>,
}
