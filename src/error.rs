// src/error.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required field missing or malformed id. Rejected before any store write.
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("a user with email \"{0}\" already exists")]
    DuplicateEmail(String),
    /// A compensating write failed after the primary write already landed.
    /// The primary entity is saved; cross-references may be stale.
    #[error("primary write saved, but cross-references may be stale: {0}")]
    Reconciliation(#[from] ReconcileError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateEmail(_) | ApiError::Store(StoreError::DuplicateKey(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::Reconciliation(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Validation(_) => "Validation Error",
            ApiError::NotFound(_) => "Not Found",
            ApiError::DuplicateEmail(_) | ApiError::Store(StoreError::DuplicateKey(_)) => {
                "Duplicate Key"
            }
            ApiError::Reconciliation(_) => "Reconciliation Error",
            ApiError::Store(_) => "Server Error",
        };
        if self.status_code().is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(self.status_code())
            .json(json!({ "message": message, "data": self.to_string() }))
    }
}

/// Checks the opaque-id shape before any lookup is attempted.
pub fn parse_id(raw: &str, what: &'static str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw)
        .map_err(|_| ApiError::Validation(format!("invalid {} id: {:?}", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_24_hex_chars() {
        assert!(parse_id("0123456789abcdef01234567", "task").is_ok());
    }

    #[test]
    fn parse_id_rejects_malformed_input() {
        for raw in ["", "nope", "0123456789abcdef0123456", "0123456789abcdef0123456g"] {
            assert!(matches!(
                parse_id(raw, "task"),
                Err(ApiError::Validation(_))
            ));
        }
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("task").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::DuplicateEmail("a@b.c".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn unique_index_violation_is_a_conflict_not_a_server_error() {
        // the race that slips past the pre-write email lookup and hits the
        // unique index must still come back as 409
        let err = ApiError::Store(StoreError::DuplicateKey(
            "E11000 duplicate key error".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
