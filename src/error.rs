// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::{PathError, StorageError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub failed_keys: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "failedKeys", skip_serializing_if = "Vec::is_empty")]
    failed_keys: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            failed_keys: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MalformedPath(e) => Self::bad_request(format!("Malformed path: {e}")),
            StorageError::NotFound(key) => Self::not_found(format!("File not found: {key}")),
            // Backend details are logged where the error is raised, not returned
            StorageError::BackendUnavailable(_) => {
                Self::service_unavailable("storage backend unavailable")
            }
            StorageError::UnauthorizedNamespaceAccess { .. } => {
                Self::forbidden("Access to this user's files is not allowed")
            }
            StorageError::PartialDeleteFailure {
                prefix,
                deleted_count,
                failed_keys,
            } => Self {
                message: format!(
                    "Deleted {deleted_count} file(s) under {prefix} but {} could not be deleted",
                    failed_keys.len()
                ),
                failed_keys,
                ..Self::internal("")
            },
        }
    }
}

impl From<PathError> for ApiError {
    fn from(err: PathError) -> Self {
        StorageError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            failed_keys: self.failed_keys,
        });
        (self.status, body).into_response()
    }
}
