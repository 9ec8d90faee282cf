// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Object store client.
//!
//! The only module that talks to the backing store. It holds one
//! `Arc<dyn ObjectStore>` built at startup and shared by every request;
//! retries and timeouts are left to the store's own transport.
//!
//! ## Consistency
//!
//! - Uploads always overwrite (last write wins, no versioning).
//! - `delete_recursive` lists first and deletes afterwards. A key written
//!   under the prefix between the two steps survives.

use std::fs;
use std::sync::Arc;

use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use tracing::{debug, info, warn};

use crate::config::{AzureConnectionString, StorageBackend, StorageConfig};

use super::folder_view::{self, extension_of, FolderEntry};
use super::paths::{KeyPrefix, ObjectKey, DELIMITER};
use super::{StorageError, StorageResult};

/// Metadata of one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type_hint: String,
}

impl From<ObjectMeta> for BlobMetadata {
    fn from(meta: ObjectMeta) -> Self {
        let key = meta.location.to_string();
        let content_type_hint = extension_of(&key).to_string();
        Self {
            key,
            size_bytes: meta.size as u64,
            last_modified: meta.last_modified,
            content_type_hint,
        }
    }
}

/// One element of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEntry {
    /// Grouped keys sharing `key` (which ends with `/`).
    CommonPrefix(String),
    /// A real object.
    Object(BlobMetadata),
}

impl RawEntry {
    pub fn key(&self) -> &str {
        match self {
            RawEntry::CommonPrefix(key) => key,
            RawEntry::Object(meta) => &meta.key,
        }
    }
}

/// How far below the prefix a listing descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Group everything past the next `/` into a common prefix.
    Delimited,
    /// Enumerate every key under the prefix.
    Recursive,
}

/// Outcome of a recursive folder delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub prefix: String,
    pub deleted_count: usize,
    pub failed_keys: Vec<String>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed_keys.is_empty()
    }

    /// Turn a report with leftovers into [`StorageError::PartialDeleteFailure`].
    pub fn into_result(self) -> StorageResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(StorageError::PartialDeleteFailure {
                prefix: self.prefix,
                deleted_count: self.deleted_count,
                failed_keys: self.failed_keys,
            })
        }
    }
}

fn store_path(raw: &str) -> StorageResult<StorePath> {
    StorePath::parse(raw).map_err(|e| {
        StorageError::BackendUnavailable(format!("key '{raw}' is not a valid store path: {e}"))
    })
}

/// Client for the flat key-value store backing all user files.
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    container: String,
}

impl ObjectStoreClient {
    /// Wrap an existing store.
    pub fn new(store: Arc<dyn ObjectStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
        }
    }

    /// Empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    /// Build the configured backend and make sure its container is usable.
    ///
    /// Missing containers are created: a directory for the local backend, a
    /// blob container for Azure. Failures are reported as
    /// [`StorageError::BackendUnavailable`].
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let store: Arc<dyn ObjectStore> = match config.backend {
            StorageBackend::Memory => Arc::new(InMemory::new()),
            StorageBackend::Local => {
                let dir = config.local_root.join(&config.container);
                if !dir.exists() {
                    info!(path = %dir.display(), "Creating storage container directory");
                    fs::create_dir_all(&dir).map_err(|e| {
                        StorageError::BackendUnavailable(format!(
                            "cannot create container directory {}: {e}",
                            dir.display()
                        ))
                    })?;
                }
                let local = LocalFileSystem::new_with_prefix(&dir).map_err(|e| {
                    StorageError::BackendUnavailable(format!("local store {}: {e}", dir.display()))
                })?;
                Arc::new(local)
            }
            StorageBackend::Azure => {
                let conn = config.azure.as_ref().ok_or_else(|| {
                    StorageError::BackendUnavailable("missing Azure connection string".to_string())
                })?;
                ensure_azure_container(&azure_container_client(conn, &config.container)?)
                    .await?;
                azure_store(conn, &config.container)?
            }
        };

        let client = Self::new(store, config.container.clone());
        client.health_check().await?;
        info!(
            container = %client.container,
            backend = ?config.backend,
            "Object store container ready"
        );
        Ok(client)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Reads at most one listing entry, proving the container is reachable.
    pub async fn health_check(&self) -> StorageResult<()> {
        match self.store.list(None).next().await {
            Some(Err(e)) => Err(StorageError::from_backend("list", &self.container, e)),
            Some(Ok(_)) | None => Ok(()),
        }
    }

    /// Store `data` at `key`, replacing any existing object.
    pub async fn upload(&self, key: &ObjectKey, data: Bytes) -> StorageResult<u64> {
        let path = store_path(key.as_str())?;
        let size = data.len() as u64;
        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| StorageError::from_backend("put", key.as_str(), e))?;
        info!(key = %key, size, "Uploaded object");
        Ok(size)
    }

    /// Full contents of the object at `key`.
    pub async fn download(&self, key: &ObjectKey) -> StorageResult<Bytes> {
        let path = store_path(key.as_str())?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| StorageError::from_backend("get", key.as_str(), e))?;
        result
            .bytes()
            .await
            .map_err(|e| StorageError::from_backend("get", key.as_str(), e))
    }

    /// Remove the object at `key`. Missing objects are not an error.
    pub async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        self.delete_raw(key.as_str()).await?;
        info!(key = %key, "Deleted object");
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> StorageResult<()> {
        let path = store_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::from_backend("delete", key, e)),
        }
    }

    /// List the entries under `prefix`.
    ///
    /// Delimited listings come back ordered by key. The stream is finite and
    /// calling this again issues a fresh listing; paging happens inside the
    /// store client.
    pub fn list_by_prefix(
        &self,
        prefix: &KeyPrefix,
        mode: ListMode,
    ) -> BoxStream<'_, StorageResult<RawEntry>> {
        let location = match store_path(prefix.trimmed()) {
            Ok(location) => location,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        let prefix = prefix.as_str().to_string();

        match mode {
            ListMode::Recursive => self
                .store
                .list(Some(&location))
                .map(move |result| {
                    result
                        .map(|meta| RawEntry::Object(meta.into()))
                        .map_err(|e| StorageError::from_backend("list", &prefix, e))
                })
                .boxed(),
            ListMode::Delimited => {
                let store = &self.store;
                stream::once(async move {
                    let listing = store
                        .list_with_delimiter(Some(&location))
                        .await
                        .map_err(|e| StorageError::from_backend("list", &prefix, e))?;
                    let mut entries: Vec<RawEntry> = listing
                        .common_prefixes
                        .into_iter()
                        .map(|p| RawEntry::CommonPrefix(format!("{p}{DELIMITER}")))
                        .chain(
                            listing
                                .objects
                                .into_iter()
                                .map(|meta| RawEntry::Object(meta.into())),
                        )
                        .collect();
                    entries.sort_by(|a, b| a.key().cmp(b.key()));
                    Ok::<_, StorageError>(entries)
                })
                .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, StorageError>)))
                .try_flatten()
                .boxed()
            }
        }
    }

    /// One-level view of the folder at `prefix`.
    pub async fn list_folder(&self, prefix: &KeyPrefix) -> StorageResult<Vec<FolderEntry>> {
        let raw: Vec<RawEntry> = self
            .list_by_prefix(prefix, ListMode::Delimited)
            .try_collect()
            .await?;
        debug!(prefix = %prefix, entries = raw.len(), "Listed folder");
        Ok(folder_view::project(prefix.as_str(), raw))
    }

    /// Delete every key under `folder`.
    ///
    /// Per-key failures are collected in the report instead of aborting; use
    /// [`DeleteReport::into_result`] to treat leftovers as an error.
    pub async fn delete_recursive(&self, folder: &KeyPrefix) -> StorageResult<DeleteReport> {
        let keys: Vec<String> = self
            .list_by_prefix(folder, ListMode::Recursive)
            .map_ok(|entry| entry.key().to_string())
            .try_collect()
            .await?;

        let mut report = DeleteReport {
            prefix: folder.as_str().to_string(),
            ..DeleteReport::default()
        };

        for key in keys {
            if folder.strip(&key).is_none() {
                warn!(key, prefix = %folder, "Listing returned key outside prefix, skipping");
                continue;
            }
            match self.delete_raw(&key).await {
                Ok(()) => report.deleted_count += 1,
                Err(e) => {
                    warn!(key, error = %e, "Failed to delete key during folder delete");
                    report.failed_keys.push(key);
                }
            }
        }

        info!(
            prefix = %folder,
            deleted = report.deleted_count,
            failed = report.failed_keys.len(),
            "Deleted folder"
        );
        Ok(report)
    }
}

/// Control-plane client for the container named in the configuration.
fn azure_container_client(
    conn: &AzureConnectionString,
    container: &str,
) -> StorageResult<ContainerClient> {
    if conn.use_development_storage {
        return Ok(ClientBuilder::emulator().container_client(container));
    }

    let credentials = match (
        &conn.account_name,
        &conn.account_key,
        &conn.shared_access_signature,
    ) {
        (Some(account), Some(key), _) => {
            StorageCredentials::access_key(account.clone(), key.clone())
        }
        (_, _, Some(sas)) => StorageCredentials::sas_token(sas.as_str()).map_err(|e| {
            StorageError::BackendUnavailable(format!("invalid shared access signature: {e}"))
        })?,
        _ => {
            return Err(StorageError::BackendUnavailable(
                "connection string has no credentials".to_string(),
            ))
        }
    };

    let builder = match (&conn.blob_endpoint, &conn.account_name) {
        (Some(endpoint), account) => ClientBuilder::with_location(
            CloudLocation::Custom {
                account: account.clone().unwrap_or_default(),
                uri: endpoint.trim_end_matches(DELIMITER).to_string(),
            },
            credentials,
        ),
        (None, Some(account)) => ClientBuilder::new(account.clone(), credentials),
        (None, None) => {
            return Err(StorageError::BackendUnavailable(
                "connection string names neither an account nor a blob endpoint".to_string(),
            ))
        }
    };
    Ok(builder.container_client(container))
}

/// Create the container unless it already exists.
async fn ensure_azure_container(client: &ContainerClient) -> StorageResult<()> {
    let container = client.container_name();
    let exists = client.exists().await.map_err(|e| {
        StorageError::BackendUnavailable(format!("container {container} lookup: {e}"))
    })?;
    if exists {
        return Ok(());
    }

    info!(container, "Creating storage container");
    client.create().await.map_err(|e| {
        warn!(container, error = %e, "Failed to create storage container");
        StorageError::BackendUnavailable(format!("container {container} create: {e}"))
    })
}

fn azure_store(
    conn: &AzureConnectionString,
    container: &str,
) -> StorageResult<Arc<dyn ObjectStore>> {
    let mut builder = MicrosoftAzureBuilder::new().with_container_name(container);

    if conn.use_development_storage {
        builder = builder.with_use_emulator(true);
    }
    if let Some(account) = &conn.account_name {
        builder = builder.with_account(account);
    }
    if let Some(key) = &conn.account_key {
        builder = builder.with_access_key(key);
    }
    if let Some(endpoint) = &conn.blob_endpoint {
        builder = builder
            .with_allow_http(endpoint.starts_with("http://"))
            .with_endpoint(endpoint.clone());
    }
    if let Some(pairs) = conn.sas_pairs() {
        builder = builder.with_sas_authorization(pairs);
    }

    let store = builder
        .build()
        .map_err(|e| StorageError::BackendUnavailable(format!("azure client: {e}")))?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::paths::UserNamespace;
    use crate::storage::testing::LockedKeysStore;
    use tempfile::TempDir;

    fn ns(user: &str) -> UserNamespace {
        UserNamespace::new(user).unwrap()
    }

    async fn put(client: &ObjectStoreClient, user: &str, path: &str, body: &'static [u8]) {
        let key = ns(user).resolve(path).unwrap();
        client.upload(&key, Bytes::from_static(body)).await.unwrap();
    }

    async fn all_keys(client: &ObjectStoreClient, prefix: &KeyPrefix) -> Vec<String> {
        client
            .list_by_prefix(prefix, ListMode::Recursive)
            .map_ok(|e| e.key().to_string())
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let client = ObjectStoreClient::in_memory();
        let key = ns("u1").resolve("docs/report.pdf").unwrap();
        let payload = Bytes::from_static(b"%PDF-1.7\x00\x01binary");

        let size = client.upload(&key, payload.clone()).await.unwrap();
        assert_eq!(size, payload.len() as u64);
        assert_eq!(client.download(&key).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn upload_overwrites_existing_object() {
        let client = ObjectStoreClient::in_memory();
        let key = ns("u1").resolve("a.txt").unwrap();
        client.upload(&key, Bytes::from_static(b"first")).await.unwrap();
        client.upload(&key, Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(client.download(&key).await.unwrap(), Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn download_missing_is_not_found() {
        let client = ObjectStoreClient::in_memory();
        let key = ns("u1").resolve("nope.txt").unwrap();
        let result = client.download(&key).await;
        assert!(matches!(result, Err(StorageError::NotFound(ref k)) if k == "u1/nope.txt"));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_leaves_tombstone() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "a.txt", b"hello").await;
        let key = ns("u1").resolve("a.txt").unwrap();

        client.delete(&key).await.unwrap();
        assert!(matches!(
            client.download(&key).await,
            Err(StorageError::NotFound(_))
        ));
        client.delete(&key).await.expect("second delete succeeds");
    }

    #[tokio::test]
    async fn delimited_listing_groups_nested_keys() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "a.txt", b"a").await;
        put(&client, "u1", "docs/b.txt", b"b").await;
        put(&client, "u1", "docs/deeper/c.txt", b"c").await;

        let entries: Vec<RawEntry> = client
            .list_by_prefix(&ns("u1").root(), ListMode::Delimited)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], RawEntry::Object(meta) if meta.key == "u1/a.txt"));
        assert_eq!(entries[1], RawEntry::CommonPrefix("u1/docs/".to_string()));
    }

    #[tokio::test]
    async fn listing_can_be_reissued() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "a.txt", b"a").await;
        let root = ns("u1").root();

        let first = all_keys(&client, &root).await;
        put(&client, "u1", "b.txt", b"b").await;
        let second = all_keys(&client, &root).await;

        assert_eq!(first, vec!["u1/a.txt"]);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn list_folder_projects_hierarchy() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "a.txt", b"abc").await;
        put(&client, "u1", "docs/b.txt", b"b").await;

        let entries = client.list_folder(&ns("u1").root()).await.unwrap();
        let names: Vec<&str> = entries.iter().map(FolderEntry::name).collect();
        assert_eq!(names, vec!["a.txt", "docs/"]);
        assert_eq!(entries[0].size_bytes(), 3);
        assert_eq!(entries[0].content_type(), "txt");
        assert!(entries[1].is_folder());
    }

    #[tokio::test]
    async fn namespaces_do_not_see_each_other() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "mine.txt", b"1").await;
        put(&client, "u2", "secret.txt", b"2").await;

        let keys = all_keys(&client, &ns("u1").root()).await;
        assert_eq!(keys, vec!["u1/mine.txt"]);
    }

    #[tokio::test]
    async fn delete_recursive_removes_whole_folder_only() {
        let client = ObjectStoreClient::in_memory();
        put(&client, "u1", "docs/a.txt", b"a").await;
        put(&client, "u1", "docs/sub/b.txt", b"b").await;
        put(&client, "u1", "docs2/keep.txt", b"k").await;
        put(&client, "u1", "top.txt", b"t").await;

        let folder = ns("u1").folder("docs").unwrap();
        let report = client.delete_recursive(&folder).await.unwrap();

        assert_eq!(report.deleted_count, 2);
        assert!(report.is_complete());
        assert!(all_keys(&client, &folder).await.is_empty());

        let remaining = all_keys(&client, &ns("u1").root()).await;
        assert!(remaining.iter().all(|k| !k.starts_with("u1/docs/")));
        assert!(remaining.contains(&"u1/docs2/keep.txt".to_string()));
        assert!(remaining.contains(&"u1/top.txt".to_string()));
    }

    #[tokio::test]
    async fn delete_recursive_on_empty_folder_reports_zero() {
        let client = ObjectStoreClient::in_memory();
        let folder = ns("u1").folder("ghost").unwrap();
        let report = client.delete_recursive(&folder).await.unwrap();
        assert_eq!(report.deleted_count, 0);
        assert_eq!(report.prefix, "u1/ghost/");
    }

    #[test]
    fn incomplete_report_becomes_partial_failure() {
        let report = DeleteReport {
            prefix: "u1/docs/".to_string(),
            deleted_count: 4,
            failed_keys: vec!["u1/docs/locked.pdf".to_string()],
        };
        match report.into_result() {
            Err(StorageError::PartialDeleteFailure {
                deleted_count,
                failed_keys,
                ..
            }) => {
                assert_eq!(deleted_count, 4);
                assert_eq!(failed_keys, vec!["u1/docs/locked.pdf"]);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn local_backend_creates_container_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StorageConfig {
            backend: StorageBackend::Local,
            container: "student-files".to_string(),
            local_root: temp_dir.path().to_path_buf(),
            azure: None,
        };

        let client = ObjectStoreClient::connect(&config).await.unwrap();
        assert!(temp_dir.path().join("student-files").is_dir());
        assert_eq!(client.container(), "student-files");

        put(&client, "u1", "docs/a.txt", b"on disk").await;
        let key = ns("u1").resolve("docs/a.txt").unwrap();
        assert_eq!(
            client.download(&key).await.unwrap(),
            Bytes::from_static(b"on disk")
        );
        client.delete(&key).await.unwrap();
        client.delete(&key).await.expect("local delete is idempotent");
    }

    #[tokio::test]
    async fn delete_recursive_collects_keys_that_fail() {
        let client = LockedKeysStore::client(&["u1/docs/locked.pdf"]);
        put(&client, "u1", "docs/a.txt", b"a").await;
        put(&client, "u1", "docs/locked.pdf", b"l").await;
        put(&client, "u1", "docs/sub/b.txt", b"b").await;

        let folder = ns("u1").folder("docs").unwrap();
        let report = client.delete_recursive(&folder).await.unwrap();

        assert_eq!(report.deleted_count, 2);
        assert_eq!(report.failed_keys, vec!["u1/docs/locked.pdf"]);
        assert_eq!(all_keys(&client, &folder).await, vec!["u1/docs/locked.pdf"]);
        assert!(matches!(
            report.into_result(),
            Err(StorageError::PartialDeleteFailure { deleted_count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn health_check_reads_populated_store() {
        let client = ObjectStoreClient::in_memory();
        for i in 0..3 {
            put(&client, "u1", &format!("f{i}.txt"), b"x").await;
        }
        client.health_check().await.unwrap();
    }

    #[test]
    fn azure_container_client_targets_configured_container() {
        let emulator = AzureConnectionString {
            use_development_storage: true,
            ..AzureConnectionString::default()
        };
        let client = azure_container_client(&emulator, "student-files").unwrap();
        assert_eq!(client.container_name(), "student-files");

        let shared_key = AzureConnectionString {
            account_name: Some("devaccount".to_string()),
            account_key: Some("a2V5".to_string()),
            ..AzureConnectionString::default()
        };
        let client = azure_container_client(&shared_key, "student-files").unwrap();
        assert_eq!(client.container_name(), "student-files");
    }

    #[test]
    fn azure_container_client_requires_credentials() {
        let anonymous = AzureConnectionString {
            account_name: Some("devaccount".to_string()),
            ..AzureConnectionString::default()
        };
        assert!(matches!(
            azure_container_client(&anonymous, "student-files"),
            Err(StorageError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn memory_backend_connects() {
        let client = ObjectStoreClient::connect(&StorageConfig::memory())
            .await
            .unwrap();
        client.health_check().await.unwrap();
    }
}
