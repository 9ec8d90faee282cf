// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Default folder skeleton for new accounts.
//!
//! A flat store has no empty folders, so each default folder gets one small
//! text object. Deleting it makes the folder disappear from listings again.

use bytes::Bytes;
use tracing::info;

use super::client::ObjectStoreClient;
use super::paths::{ObjectKey, UserNamespace};
use super::StorageResult;

/// Sentinel objects written for every new user, relative to their namespace.
pub const DEFAULT_LAYOUT: &[&str] = &[
    "Photos/Videos.txt",
    "Music/Music.txt",
    "Pictures/Pictures.txt",
    "Documents/Documents.txt",
];

/// Body of every sentinel object.
pub fn sentinel_content(user_id: &str) -> String {
    format!("This is default file for user {user_id}")
}

/// Writes the default layout into a user's namespace.
pub struct BootstrapSeeder<'a> {
    client: &'a ObjectStoreClient,
}

impl<'a> BootstrapSeeder<'a> {
    pub fn new(client: &'a ObjectStoreClient) -> Self {
        Self { client }
    }

    /// Write every sentinel, overwriting existing ones. Returns the keys written.
    pub async fn seed(&self, namespace: &UserNamespace) -> StorageResult<Vec<ObjectKey>> {
        let content = Bytes::from(sentinel_content(namespace.user_id()));
        let mut written = Vec::with_capacity(DEFAULT_LAYOUT.len());

        for path in DEFAULT_LAYOUT {
            let key = namespace.resolve(path)?;
            self.client.upload(&key, content.clone()).await?;
            written.push(key);
        }

        info!(
            user_id = namespace.user_id(),
            folders = written.len(),
            "Seeded default folders"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::folder_view::FolderEntry;

    #[tokio::test]
    async fn seeded_folders_show_up_in_listing() {
        let client = ObjectStoreClient::in_memory();
        let namespace = UserNamespace::new("42").unwrap();

        let keys = BootstrapSeeder::new(&client).seed(&namespace).await.unwrap();
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| k.user_id() == "42"));

        let entries = client.list_folder(&namespace.root()).await.unwrap();
        let names: Vec<&str> = entries.iter().map(FolderEntry::name).collect();
        assert_eq!(names, vec!["Documents/", "Music/", "Photos/", "Pictures/"]);
        assert!(entries.iter().all(FolderEntry::is_folder));
    }

    #[tokio::test]
    async fn sentinel_carries_user_id() {
        let client = ObjectStoreClient::in_memory();
        let namespace = UserNamespace::new("42").unwrap();
        BootstrapSeeder::new(&client).seed(&namespace).await.unwrap();

        let key = namespace.resolve("Documents/Documents.txt").unwrap();
        let body = client.download(&key).await.unwrap();
        assert_eq!(body, Bytes::from("This is default file for user 42"));
    }

    #[tokio::test]
    async fn deleting_sentinel_hides_folder() {
        let client = ObjectStoreClient::in_memory();
        let namespace = UserNamespace::new("42").unwrap();
        BootstrapSeeder::new(&client).seed(&namespace).await.unwrap();

        let key = namespace.resolve("Music/Music.txt").unwrap();
        client.delete(&key).await.unwrap();

        let entries = client.list_folder(&namespace.root()).await.unwrap();
        assert!(entries.iter().all(|e| e.name() != "Music/"));
        assert_eq!(entries.len(), 3);
    }
}
