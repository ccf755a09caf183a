pub mod task;
pub mod user;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::store::Page;

/// Uniform `{ message, data }` response body used by every endpoint,
/// success and failure alike.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: String,
    pub data: T,
}

pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        message: message.to_string(),
        data,
    })
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, "OK", data)
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, "Created", data)
}

/// Query parameters shared by the two list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<i64>,
    #[serde(default)]
    pub count: bool,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page {
            skip: self.skip,
            limit: self.limit.map(|limit| limit.max(0)),
        }
    }
}
