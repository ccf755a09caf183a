// src/users.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::{parse_id, ApiError};
use crate::models::user::{User, UserPayload};
use crate::models::{created, ok, respond, ListQuery};

/// GET /api/users
pub async fn list_users(
    data: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    if query.count {
        let count = data.store.count_users().await?;
        return Ok(ok(json!({ "count": count })));
    }
    let users = data.store.list_users(query.page()).await?;
    Ok(ok(users))
}

/// GET /api/users/{id}
pub async fn get_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "user")?;
    match data.store.find_user(id).await? {
        Some(user) => Ok(ok(user)),
        None => Err(ApiError::NotFound("user")),
    }
}

/// POST /api/users
pub async fn create_user(
    data: web::Data<AppState>,
    payload: web::Json<UserPayload>,
) -> Result<HttpResponse, ApiError> {
    let (name, email, pending_tasks) = validate_payload(payload.into_inner())?;
    if data.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::DuplicateEmail(email));
    }

    let user = User {
        id: ObjectId::new(),
        name,
        email,
        pending_tasks,
        date_created: Utc::now(),
    };
    data.store.insert_user(&user).await?;
    info!("User created: {}", user.id.to_hex());

    // two-way sync: claim any tasks listed at creation
    data.reconciler.after_user_replace(&user, &[]).await?;
    Ok(created(user))
}

/// PUT /api/users/{id}, full replace
pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UserPayload>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "user")?;
    let existing = data
        .store
        .find_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let (name, email, pending_tasks) = validate_payload(payload.into_inner())?;
    if let Some(other) = data.store.find_user_by_email(&email).await? {
        if other.id != existing.id {
            return Err(ApiError::DuplicateEmail(email));
        }
    }

    let user = User {
        id: existing.id,
        name,
        email,
        pending_tasks,
        date_created: existing.date_created,
    };
    data.store.replace_user(&user).await?;

    data.reconciler
        .after_user_replace(&user, &existing.pending_tasks)
        .await?;
    Ok(ok(user))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "user")?;
    let user = data
        .store
        .delete_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!("User deleted: {}", user.id.to_hex());

    data.reconciler.after_user_delete(&user).await?;
    Ok(respond(
        actix_web::http::StatusCode::OK,
        "Deleted",
        json!({ "_id": user.id.to_hex() }),
    ))
}

/// Required-field checks, email normalization, and pendingTasks id parsing.
/// Duplicate ids in the request collapse to one, insertion order kept.
fn validate_payload(payload: UserPayload) -> Result<(String, String, Vec<ObjectId>), ApiError> {
    let name = match payload.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::Validation("user name is required".to_string())),
    };
    let email = match payload.email {
        Some(email) if !email.trim().is_empty() => User::normalize_email(&email),
        _ => return Err(ApiError::Validation("user email is required".to_string())),
    };

    let mut pending_tasks = Vec::with_capacity(payload.pending_tasks.len());
    for raw in &payload.pending_tasks {
        let id = parse_id(raw, "pending task")?;
        if !pending_tasks.contains(&id) {
            pending_tasks.push(id);
        }
    }
    Ok((name, email, pending_tasks))
}
