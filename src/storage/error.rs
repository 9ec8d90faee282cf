// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error type for object storage operations.

use thiserror::Error;

use super::paths::PathError;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Request path could not be turned into a key.
    #[error("malformed path: {0}")]
    MalformedPath(#[from] PathError),
    /// No object at the requested key.
    #[error("not found: {0}")]
    NotFound(String),
    /// Transport, auth or container provisioning failure.
    ///
    /// The message is for logs only; it is never shown to callers.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),
    /// Recursive delete left some keys behind.
    #[error("{} key(s) under {prefix} could not be deleted", failed_keys.len())]
    PartialDeleteFailure {
        prefix: String,
        deleted_count: usize,
        failed_keys: Vec<String>,
    },
    /// Caller asked for a namespace other than their own.
    #[error("user {caller} cannot access namespace {namespace}")]
    UnauthorizedNamespaceAccess { caller: String, namespace: String },
}

impl StorageError {
    /// Map an object store failure on `key`, keeping only "not found" distinct.
    pub(crate) fn from_backend(operation: &str, key: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::warn!(operation, key, error = %other, "Object store request failed");
                StorageError::BackendUnavailable(format!("{operation} {key}: {other}"))
            }
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_key() {
        let err = StorageError::from_backend(
            "get",
            "u1/a.txt",
            object_store::Error::NotFound {
                path: "u1/a.txt".to_string(),
                source: "missing".into(),
            },
        );
        assert!(matches!(err, StorageError::NotFound(ref k) if k == "u1/a.txt"));
    }

    #[test]
    fn other_backend_errors_are_unavailable() {
        let err = StorageError::from_backend(
            "put",
            "u1/a.txt",
            object_store::Error::Generic {
                store: "Azure",
                source: "connection reset".into(),
            },
        );
        assert!(matches!(err, StorageError::BackendUnavailable(_)));
    }

    #[test]
    fn partial_failure_message_counts_keys() {
        let err = StorageError::PartialDeleteFailure {
            prefix: "u1/docs/".to_string(),
            deleted_count: 3,
            failed_keys: vec!["u1/docs/a".to_string(), "u1/docs/b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 key(s) under u1/docs/ could not be deleted"
        );
    }
}
