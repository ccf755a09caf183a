// src/store/mod.rs
//
// Document-store adapter consumed by the handlers and the reconciler.
// `mongo::MongoStore` is the production backend; `memory::MemoryStore` is the
// in-memory fake the reconciler tests run against.

#[cfg(test)]
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::task::{Task, UNASSIGNED_NAME};
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write (Mongo E11000). Seen when two
    /// writes race past the pre-write email lookup.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Database(mongodb::error::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) =
            &*err.kind
        {
            if we.code == 11000 {
                return StoreError::DuplicateKey(we.message.clone());
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Offset pagination for the list operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub skip: u64,
    pub limit: Option<i64>,
}

/// Filters over the task collection. These are the only shapes the system
/// needs: id-in-set, the conditional form used by the reconciler's removal
/// pass, and assignedUser equality for drift sweeps.
#[derive(Debug, Clone)]
pub enum TaskSelector {
    /// `_id` is in the given set.
    IdIn(Vec<ObjectId>),
    /// `_id` is in the given set and `assignedUser` equals the given hex id.
    IdInAssignedTo(Vec<ObjectId>, String),
    /// `assignedUser` equals the given hex id.
    AssignedTo(String),
}

/// Filters over the user collection.
#[derive(Debug, Clone)]
pub enum UserSelector {
    /// `_id` equals the given id.
    Id(ObjectId),
    /// `pendingTasks` contains the given task id.
    PendingContains(ObjectId),
    /// `pendingTasks` contains the given task id and `_id` differs from the
    /// second argument (everyone except the task's rightful owner).
    PendingContainsExcept(ObjectId, ObjectId),
}

/// `$set` payload for the two assignment fields on a task.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub assigned_user: String,
    pub assigned_user_name: String,
}

impl Assignment {
    pub fn to_user(user: &User) -> Self {
        Self {
            assigned_user: user.id.to_hex(),
            assigned_user_name: user.name.clone(),
        }
    }

    pub fn unassigned() -> Self {
        Self {
            assigned_user: String::new(),
            assigned_user_name: UNASSIGNED_NAME.to_string(),
        }
    }
}

/// The persistence contract. Callers mint document ids with `ObjectId::new()`
/// before inserting, as the MongoDB driver itself would.
#[async_trait]
pub trait Store: Send + Sync {
    // -- tasks --

    async fn list_tasks(&self, page: Page) -> StoreResult<Vec<Task>>;
    async fn count_tasks(&self) -> StoreResult<u64>;
    async fn find_task(&self, id: ObjectId) -> StoreResult<Option<Task>>;
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;
    /// Full replace keyed on `_id`. Returns whether a document matched.
    async fn replace_task(&self, task: &Task) -> StoreResult<bool>;
    /// Applies the assignment fields to every task the selector matches.
    /// Returns the number of documents modified.
    async fn set_assignment(&self, selector: TaskSelector, assignment: &Assignment)
        -> StoreResult<u64>;
    /// Removes the task and returns its last persisted state.
    async fn delete_task(&self, id: ObjectId) -> StoreResult<Option<Task>>;

    // -- users --

    async fn list_users(&self, page: Page) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<u64>;
    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    /// Lookup on the normalized (trimmed, lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    /// Full replace keyed on `_id`. Returns whether a document matched.
    async fn replace_user(&self, user: &User) -> StoreResult<bool>;
    /// Appends the task id to the user's `pendingTasks` unless already
    /// present (`$addToSet`). Returns the number of documents modified.
    async fn add_pending_task(&self, user_id: ObjectId, task_id: ObjectId) -> StoreResult<u64>;
    /// Pulls the task id out of `pendingTasks` for every matched user.
    async fn remove_pending_task(&self, selector: UserSelector, task_id: ObjectId)
        -> StoreResult<u64>;
    /// Removes the user and returns its last persisted state.
    async fn delete_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
}
