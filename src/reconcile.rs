// src/reconcile.rs
//
// The consistency reconciler. The assignment relationship is stored twice,
// `Task.assignedUser` forward and `User.pendingTasks` reverse, with no
// transactions across the two collections. After every write that can touch
// the relationship, one of the operations below issues the compensating
// reads/writes that restore the invariants:
//
//   1. an assigned task appears in its user's pendingTasks
//   2. every pendingTasks entry points back at that user (or at nothing)
//   3. assignedUserName matches the referenced user's current name
//   4. a dangling assignedUser reference is reset to unassigned
//   5. no task id sits in two users' pendingTasks at once
//
// Every operation is idempotent: re-running it with the same inputs leaves
// the store unchanged. Failures never roll back the primary write; the
// system favors eventual convergence over atomicity.

use std::sync::Arc;

use log::{debug, warn};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::task::Task;
use crate::models::user::User;
use crate::store::{Assignment, Store, StoreError, TaskSelector, UserSelector};

#[derive(Debug, Error)]
#[error("compensating write during {op} failed: {source}")]
pub struct ReconcileError {
    op: &'static str,
    #[source]
    source: StoreError,
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn Store>,
    /// When set, a user replace also re-stamps the name on drifted tasks:
    /// tasks whose assignedUser points at the user but whose id is missing
    /// from the user's pendingTasks.
    restamp_drifted: bool,
}

impl Reconciler {
    pub fn new(store: Arc<dyn Store>, restamp_drifted: bool) -> Self {
        Self {
            store,
            restamp_drifted,
        }
    }

    /// Restores the user side after a task create or replace.
    /// `prev_assigned_user` is the hex id the task held before this write,
    /// empty for a fresh task. Mutates `task` in place where the write path
    /// corrects it (name re-stamp, dangling-reference reset) so the caller
    /// responds with the reconciled state.
    pub async fn after_task_write(
        &self,
        task: &mut Task,
        prev_assigned_user: &str,
    ) -> Result<(), ReconcileError> {
        let fail = |source| ReconcileError {
            op: "task write",
            source,
        };

        if task.is_assigned() {
            // accepted ids are validated at the boundary, so a parse failure
            // here is the same dangling state as a missing user
            let owner = match ObjectId::parse_str(&task.assigned_user) {
                Ok(id) => self.store.find_user(id).await.map_err(fail)?,
                Err(_) => None,
            };
            match owner {
                Some(user) => {
                    if !user.pending_tasks.contains(&task.id) {
                        self.store
                            .add_pending_task(user.id, task.id)
                            .await
                            .map_err(fail)?;
                    }
                    if task.assigned_user_name != user.name {
                        task.assigned_user_name = user.name;
                        self.store.replace_task(task).await.map_err(fail)?;
                    }
                }
                None => {
                    warn!(
                        "task {} referenced missing user {}, resetting assignment",
                        task.id.to_hex(),
                        task.assigned_user
                    );
                    task.clear_assignment();
                    self.store.replace_task(task).await.map_err(fail)?;
                }
            }
        }

        // stale membership in the previous owner's list
        if !prev_assigned_user.is_empty() && prev_assigned_user != task.assigned_user {
            if let Ok(prev_id) = ObjectId::parse_str(prev_assigned_user) {
                self.store
                    .remove_pending_task(UserSelector::Id(prev_id), task.id)
                    .await
                    .map_err(fail)?;
            }
        }

        // global sweep; also heals drift left by writes that bypassed us
        if !task.is_assigned() {
            self.store
                .remove_pending_task(UserSelector::PendingContains(task.id), task.id)
                .await
                .map_err(fail)?;
        }

        Ok(())
    }

    /// Restores the task side after a user create or replace.
    /// `prev_pending` is the pendingTasks list the user held before this
    /// write, empty for a fresh user. Removals run before additions so a
    /// task id moved between users inside one request ends up assigned,
    /// never cleared.
    pub async fn after_user_replace(
        &self,
        user: &User,
        prev_pending: &[ObjectId],
    ) -> Result<(), ReconcileError> {
        let fail = |source| ReconcileError {
            op: "user replace",
            source,
        };

        let removed: Vec<ObjectId> = prev_pending
            .iter()
            .filter(|id| !user.pending_tasks.contains(id))
            .copied()
            .collect();
        if !removed.is_empty() {
            // conditional on assignedUser: a task reassigned elsewhere in the
            // interim keeps its new owner
            let cleared = self
                .store
                .set_assignment(
                    TaskSelector::IdInAssignedTo(removed, user.id.to_hex()),
                    &Assignment::unassigned(),
                )
                .await
                .map_err(fail)?;
            debug!("user {} replace: {} task(s) unassigned", user.id.to_hex(), cleared);
        }

        // the user side is authoritative for ids it explicitly lists
        if !user.pending_tasks.is_empty() {
            self.store
                .set_assignment(
                    TaskSelector::IdIn(user.pending_tasks.clone()),
                    &Assignment::to_user(user),
                )
                .await
                .map_err(fail)?;
            // claimed tasks must not linger in anyone else's list
            for task_id in &user.pending_tasks {
                self.store
                    .remove_pending_task(
                        UserSelector::PendingContainsExcept(*task_id, user.id),
                        *task_id,
                    )
                    .await
                    .map_err(fail)?;
            }
        }

        if self.restamp_drifted {
            self.store
                .set_assignment(
                    TaskSelector::AssignedTo(user.id.to_hex()),
                    &Assignment::to_user(user),
                )
                .await
                .map_err(fail)?;
        }

        Ok(())
    }

    /// Unassigns every task the deleted user still claimed.
    pub async fn after_user_delete(&self, user: &User) -> Result<(), ReconcileError> {
        let fail = |source| ReconcileError {
            op: "user delete",
            source,
        };

        if !user.pending_tasks.is_empty() {
            self.store
                .set_assignment(
                    TaskSelector::IdIn(user.pending_tasks.clone()),
                    &Assignment::unassigned(),
                )
                .await
                .map_err(fail)?;
        }
        // drift cover: tasks pointing at the user without appearing in its list
        self.store
            .set_assignment(
                TaskSelector::AssignedTo(user.id.to_hex()),
                &Assignment::unassigned(),
            )
            .await
            .map_err(fail)?;

        Ok(())
    }

    /// Removes a deleted task from every pendingTasks list that still has it.
    pub async fn after_task_delete(&self, task_id: ObjectId) -> Result<(), ReconcileError> {
        self.store
            .remove_pending_task(UserSelector::PendingContains(task_id), task_id)
            .await
            .map_err(|source| ReconcileError {
                op: "task delete",
                source,
            })?;
        Ok(())
    }
}
