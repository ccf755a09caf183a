// src/tasks.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::{parse_id, ApiError};
use crate::models::task::{Task, TaskPayload, UNASSIGNED_NAME};
use crate::models::{created, ok, respond, ListQuery};

/// GET /api/tasks
pub async fn list_tasks(
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    if query.count {
        let count = data.store.count_tasks().await?;
        return Ok(ok(json!({ "count": count })));
    }
    let tasks = data.store.list_tasks(query.page()).await?;
    Ok(ok(tasks))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "task")?;
    match data.store.find_task(id).await? {
        Some(task) => Ok(ok(task)),
        None => Err(ApiError::NotFound("task")),
    }
}

/// POST /api/tasks
pub async fn create_task(
    data: web::Data<AppState>,
    payload: web::Json<TaskPayload>,
) -> Result<HttpResponse, ApiError> {
    let mut task = build_task(payload.into_inner(), ObjectId::new(), Utc::now())?;
    data.store.insert_task(&task).await?;
    info!("Task created: {}", task.id.to_hex());

    data.reconciler.after_task_write(&mut task, "").await?;
    Ok(created(task))
}

/// PUT /api/tasks/{id}, full replace
pub async fn update_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<TaskPayload>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "task")?;
    let existing = data
        .store
        .find_task(id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;

    let mut task = build_task(payload.into_inner(), existing.id, existing.date_created)?;
    let prev_assigned_user = existing.assigned_user;
    data.store.replace_task(&task).await?;

    data.reconciler
        .after_task_write(&mut task, &prev_assigned_user)
        .await?;
    Ok(ok(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "task")?;
    let task = data
        .store
        .delete_task(id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    info!("Task deleted: {}", task.id.to_hex());

    data.reconciler.after_task_delete(task.id).await?;
    Ok(respond(
        actix_web::http::StatusCode::OK,
        "Deleted",
        json!({ "_id": task.id.to_hex() }),
    ))
}

/// Applies the required-field and id-shape checks, then shapes the document.
/// The reconciler corrects `assignedUserName` afterwards; the value here only
/// has to respect "unassigned means unassigned".
fn build_task(
    payload: TaskPayload,
    id: ObjectId,
    date_created: DateTime<Utc>,
) -> Result<Task, ApiError> {
    let name = match payload.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::Validation("task name is required".to_string())),
    };
    let deadline = payload
        .deadline
        .ok_or_else(|| ApiError::Validation("task deadline is required".to_string()))?;
    if !payload.assigned_user.is_empty() {
        parse_id(&payload.assigned_user, "assigned user")?;
    }
    let assigned_user_name = if payload.assigned_user.is_empty() {
        UNASSIGNED_NAME.to_string()
    } else {
        payload
            .assigned_user_name
            .unwrap_or_else(|| UNASSIGNED_NAME.to_string())
    };

    Ok(Task {
        id,
        name,
        description: payload.description,
        deadline,
        completed: payload.completed,
        assigned_user: payload.assigned_user,
        assigned_user_name,
        date_created,
    })
}
