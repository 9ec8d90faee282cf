// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User-Scoped Object Storage
//!
//! This module presents a per-user folder/file hierarchy on top of a flat
//! key-value object store (Azure Blob Storage, a local directory, or memory).
//!
//! ## Key Layout
//!
//! ```text
//! {container}/
//!   {user_id}/
//!     Documents/Documents.txt   # seeded at account creation
//!     Music/Music.txt
//!     Photos/Videos.txt
//!     Pictures/Pictures.txt
//!     {any uploaded path}
//! ```
//!
//! ## Flow
//!
//! 1. `ownership` checks the caller owns `{user_id}`
//! 2. `paths` validates the request path into an `ObjectKey` or `KeyPrefix`
//! 3. `client` runs the operation against the store
//! 4. `folder_view` turns delimited listings into folder entries
//!
//! ## Important Notes
//!
//! - Only `client` touches the store
//! - Folders are inferred from key prefixes; there are no folder objects
//! - Recursive delete is not atomic with respect to concurrent uploads

pub mod client;
pub mod error;
pub mod folder_view;
pub mod ownership;
pub mod paths;
pub mod seeder;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{BlobMetadata, DeleteReport, ListMode, ObjectStoreClient, RawEntry};
pub use error::{StorageError, StorageResult};
pub use folder_view::{extension_of, FolderEntry};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::{KeyPrefix, ObjectKey, PathError, UserNamespace};
pub use seeder::BootstrapSeeder;
