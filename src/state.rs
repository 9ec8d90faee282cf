// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::AuthSettings;
use crate::storage::ObjectStoreClient;

/// Bearer token verification settings shared with the `Auth` extractor.
pub type AuthConfig = AuthSettings;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<ObjectStoreClient>,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(storage: ObjectStoreClient) -> Self {
        Self {
            storage: Arc::new(storage),
            auth_config: Arc::new(AuthConfig::default()),
        }
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = Arc::new(auth_config);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ObjectStoreClient::in_memory())
    }
}
