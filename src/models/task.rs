use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Display name stamped on a task that has no assigned user.
pub const UNASSIGNED_NAME: &str = "unassigned";

/// A task document. `assignedUser`/`assignedUserName` are the forward half of
/// the assignment relationship; the reverse half lives in `User.pendingTasks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// MongoDB document ID.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    /// Hex id of the assigned user; empty string means unassigned.
    #[serde(default)]
    pub assigned_user: String,
    /// Denormalized copy of the assigned user's name.
    #[serde(default = "default_assigned_user_name")]
    pub assigned_user_name: String,
    pub date_created: DateTime<Utc>,
}

fn default_assigned_user_name() -> String {
    UNASSIGNED_NAME.to_string()
}

impl Task {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_user.is_empty()
    }

    /// Resets both assignment fields to the unassigned state.
    pub fn clear_assignment(&mut self) {
        self.assigned_user.clear();
        self.assigned_user_name = UNASSIGNED_NAME.to_string();
    }
}

/// Body of POST /api/tasks and PUT /api/tasks/{id}. Required fields arrive as
/// Options so their absence maps to a Validation error, not a parse failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub assigned_user: String,
    pub assigned_user_name: Option<String>,
}
