// src/store/mongo.rs

use async_trait::async_trait;
use futures_util::StreamExt;
use log::warn;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::models::task::Task;
use crate::models::user::User;
use crate::store::{
    Assignment, Page, Store, StoreResult, TaskSelector, UserSelector,
};

pub struct MongoStore {
    pub db: Database,
}

impl MongoStore {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        let store = MongoStore { db };
        store.ensure_indexes().await;
        store
    }

    /// Unique email index; backstop for the pre-write conflict check.
    async fn ensure_indexes(&self) {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        if let Err(e) = self.users().create_index(index).await {
            warn!("Could not create unique email index: {}", e);
        }
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection("tasks")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

fn task_filter(selector: &TaskSelector) -> Document {
    match selector {
        TaskSelector::IdIn(ids) => doc! { "_id": { "$in": ids.clone() } },
        TaskSelector::IdInAssignedTo(ids, user_id) => {
            doc! { "_id": { "$in": ids.clone() }, "assignedUser": user_id }
        }
        TaskSelector::AssignedTo(user_id) => doc! { "assignedUser": user_id },
    }
}

fn user_filter(selector: &UserSelector) -> Document {
    match selector {
        UserSelector::Id(id) => doc! { "_id": *id },
        UserSelector::PendingContains(task_id) => doc! { "pendingTasks": *task_id },
        UserSelector::PendingContainsExcept(task_id, keep) => {
            doc! { "pendingTasks": *task_id, "_id": { "$ne": *keep } }
        }
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn list_tasks(&self, page: Page) -> StoreResult<Vec<Task>> {
        // the find builder borrows the collection, so it needs a binding
        let tasks_coll = self.tasks();
        let mut find = tasks_coll.find(doc! {});
        if page.skip > 0 {
            find = find.skip(page.skip);
        }
        if let Some(limit) = page.limit {
            find = find.limit(limit);
        }
        let mut cursor = find.await?;
        let mut tasks = Vec::new();
        while let Some(task) = cursor.next().await {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    async fn count_tasks(&self) -> StoreResult<u64> {
        Ok(self.tasks().count_documents(doc! {}).await?)
    }

    async fn find_task(&self, id: ObjectId) -> StoreResult<Option<Task>> {
        Ok(self.tasks().find_one(doc! { "_id": id }).await?)
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<bool> {
        let res = self
            .tasks()
            .replace_one(doc! { "_id": task.id }, task)
            .await?;
        Ok(res.matched_count > 0)
    }

    async fn set_assignment(
        &self,
        selector: TaskSelector,
        assignment: &Assignment,
    ) -> StoreResult<u64> {
        let update = doc! { "$set": {
            "assignedUser": &assignment.assigned_user,
            "assignedUserName": &assignment.assigned_user_name,
        } };
        let res = self
            .tasks()
            .update_many(task_filter(&selector), update)
            .await?;
        Ok(res.modified_count)
    }

    async fn delete_task(&self, id: ObjectId) -> StoreResult<Option<Task>> {
        Ok(self.tasks().find_one_and_delete(doc! { "_id": id }).await?)
    }

    async fn list_users(&self, page: Page) -> StoreResult<Vec<User>> {
        let users_coll = self.users();
        let mut find = users_coll.find(doc! {});
        if page.skip > 0 {
            find = find.skip(page.skip);
        }
        if let Some(limit) = page.limit {
            find = find.limit(limit);
        }
        let mut cursor = find.await?;
        let mut users = Vec::new();
        while let Some(user) = cursor.next().await {
            users.push(user?);
        }
        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.users().count_documents(doc! {}).await?)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> StoreResult<bool> {
        let res = self
            .users()
            .replace_one(doc! { "_id": user.id }, user)
            .await?;
        Ok(res.matched_count > 0)
    }

    async fn add_pending_task(&self, user_id: ObjectId, task_id: ObjectId) -> StoreResult<u64> {
        let res = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "pendingTasks": task_id } },
            )
            .await?;
        Ok(res.modified_count)
    }

    async fn remove_pending_task(
        &self,
        selector: UserSelector,
        task_id: ObjectId,
    ) -> StoreResult<u64> {
        let res = self
            .users()
            .update_many(
                user_filter(&selector),
                doc! { "$pull": { "pendingTasks": task_id } },
            )
            .await?;
        Ok(res.modified_count)
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one_and_delete(doc! { "_id": id }).await?)
    }
}
