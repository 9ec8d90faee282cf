// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for user namespaces.
//!
//! Every HTTP request names a `{user_id}`. Before any key is resolved the
//! caller must be shown to own that namespace; this is the only place that
//! check happens.

use crate::auth::AuthenticatedUser;

use super::paths::UserNamespace;
use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::UnauthorizedNamespaceAccess` if the user doesn't
    /// own the resource.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id {
            Ok(())
        } else {
            Err(StorageError::UnauthorizedNamespaceAccess {
                caller: user.user_id.clone(),
                namespace: self.owner_user_id().to_string(),
            })
        }
    }
}

impl OwnedResource for UserNamespace {
    fn owner_user_id(&self) -> &str {
        self.user_id()
    }
}

impl UserNamespace {
    /// Namespace `user_id`, provided `user` owns it.
    pub fn authorize(user: &AuthenticatedUser, user_id: &str) -> StorageResult<Self> {
        let namespace = UserNamespace::new(user_id)?;
        if let Err(e) = namespace.verify_ownership(user) {
            tracing::warn!(
                caller = %user.user_id,
                namespace = user_id,
                "Rejected access to foreign namespace"
            );
            return Err(e);
        }
        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            session_id: None,
            issuer: "test".to_string(),
            expires_at: 0,
        }
    }

    #[test]
    fn owner_is_authorized() {
        let namespace = UserNamespace::authorize(&make_user("u1"), "u1").unwrap();
        assert_eq!(namespace.user_id(), "u1");
        assert_eq!(namespace.root().as_str(), "u1/");
    }

    #[test]
    fn other_user_is_rejected() {
        let result = UserNamespace::authorize(&make_user("u2"), "u1");
        match result {
            Err(StorageError::UnauthorizedNamespaceAccess { caller, namespace }) => {
                assert_eq!(caller, "u2");
                assert_eq!(namespace, "u1");
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn invalid_user_id_is_malformed_before_ownership() {
        let result = UserNamespace::authorize(&make_user(".."), "..");
        assert!(matches!(result, Err(StorageError::MalformedPath(_))));
    }

    #[test]
    fn ownership_verification_on_namespace() {
        let namespace = UserNamespace::new("u1").unwrap();
        assert!(namespace.verify_ownership(&make_user("u1")).is_ok());
        assert!(namespace.verify_ownership(&make_user("u10")).is_err());
    }
}
