// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the object store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult, Result,
};

use super::client::ObjectStoreClient;

/// In-memory store whose `delete` fails for a fixed set of keys.
#[derive(Debug, Default)]
pub struct LockedKeysStore {
    inner: InMemory,
    locked: Vec<String>,
}

impl LockedKeysStore {
    pub fn new(locked: &[&str]) -> Self {
        Self {
            inner: InMemory::new(),
            locked: locked.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Client over a fresh store with `locked` keys undeletable.
    pub fn client(locked: &[&str]) -> ObjectStoreClient {
        ObjectStoreClient::new(Arc::new(Self::new(locked)), "locked")
    }
}

impl fmt::Display for LockedKeysStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LockedKeysStore({} locked)", self.locked.len())
    }
}

#[async_trait]
impl ObjectStore for LockedKeysStore {
    async fn put_opts(
        &self,
        location: &StorePath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &StorePath,
        opts: PutMultipartOpts,
    ) -> Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, location: &StorePath, options: GetOptions) -> Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &StorePath) -> Result<()> {
        if self.locked.iter().any(|k| k.as_str() == location.as_ref()) {
            return Err(object_store::Error::Generic {
                store: "LockedKeysStore",
                source: format!("{location} is locked").into(),
            });
        }
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&StorePath>) -> BoxStream<'_, Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&StorePath>) -> Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &StorePath, to: &StorePath) -> Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &StorePath, to: &StorePath) -> Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}
