// src/store/memory.rs
//
// In-memory Store used by the reconciler and handler tests. Listing order is
// unspecified, which matches what the contract promises.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::task::Task;
use crate::models::user::User;
use crate::store::{
    Assignment, Page, Store, StoreResult, TaskSelector, UserSelector,
};

#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<ObjectId, Task>>,
    users: RwLock<HashMap<ObjectId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn task_matches(selector: &TaskSelector, task: &Task) -> bool {
    match selector {
        TaskSelector::IdIn(ids) => ids.contains(&task.id),
        TaskSelector::IdInAssignedTo(ids, user_id) => {
            ids.contains(&task.id) && task.assigned_user == *user_id
        }
        TaskSelector::AssignedTo(user_id) => task.assigned_user == *user_id,
    }
}

fn user_matches(selector: &UserSelector, user: &User) -> bool {
    match selector {
        UserSelector::Id(id) => user.id == *id,
        UserSelector::PendingContains(task_id) => user.pending_tasks.contains(task_id),
        UserSelector::PendingContainsExcept(task_id, keep) => {
            user.pending_tasks.contains(task_id) && user.id != *keep
        }
    }
}

fn paginate<T>(mut items: Vec<T>, page: Page) -> Vec<T> {
    let skip = page.skip.min(items.len() as u64) as usize;
    let mut items = items.split_off(skip);
    // limit 0 means "no limit", as MongoDB treats it
    if let Some(limit) = page.limit {
        if limit > 0 {
            items.truncate(limit as usize);
        }
    }
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_tasks(&self, page: Page) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().unwrap().values().cloned().collect();
        Ok(paginate(tasks, page))
    }

    async fn count_tasks(&self) -> StoreResult<u64> {
        Ok(self.tasks.read().unwrap().len() as u64)
    }

    async fn find_task(&self, id: ObjectId) -> StoreResult<Option<Task>> {
        Ok(self.tasks.read().unwrap().get(&id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.tasks.write().unwrap().insert(task.id, task.clone());
        Ok(())
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().unwrap();
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_assignment(
        &self,
        selector: TaskSelector,
        assignment: &Assignment,
    ) -> StoreResult<u64> {
        let mut modified = 0;
        for task in self.tasks.write().unwrap().values_mut() {
            if task_matches(&selector, task)
                && (task.assigned_user != assignment.assigned_user
                    || task.assigned_user_name != assignment.assigned_user_name)
            {
                task.assigned_user = assignment.assigned_user.clone();
                task.assigned_user_name = assignment.assigned_user_name.clone();
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_task(&self, id: ObjectId) -> StoreResult<Option<Task>> {
        Ok(self.tasks.write().unwrap().remove(&id))
    }

    async fn list_users(&self, page: Page) -> StoreResult<Vec<User>> {
        let users = self.users.read().unwrap().values().cloned().collect();
        Ok(paginate(users, page))
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.users.read().unwrap().len() as u64)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users.write().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_pending_task(&self, user_id: ObjectId, task_id: ObjectId) -> StoreResult<u64> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&user_id) {
            Some(user) if !user.pending_tasks.contains(&task_id) => {
                user.pending_tasks.push(task_id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn remove_pending_task(
        &self,
        selector: UserSelector,
        task_id: ObjectId,
    ) -> StoreResult<u64> {
        let mut modified = 0;
        for user in self.users.write().unwrap().values_mut() {
            if user_matches(&selector, user) && user.pending_tasks.contains(&task_id) {
                user.pending_tasks.retain(|id| *id != task_id);
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.write().unwrap().remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_treats_limit_zero_as_no_limit() {
        let items = vec![1, 2, 3];
        let page = Page {
            skip: 0,
            limit: Some(0),
        };
        assert_eq!(paginate(items, page), vec![1, 2, 3]);
    }

    #[test]
    fn paginate_applies_skip_and_positive_limit() {
        let items = vec![1, 2, 3, 4];
        let page = Page {
            skip: 1,
            limit: Some(2),
        };
        assert_eq!(paginate(items, page), vec![2, 3]);
    }
}
