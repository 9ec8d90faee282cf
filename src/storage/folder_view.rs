// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Virtual one-level directory view over a delimited prefix listing.
//!
//! Folders are not objects. They are inferred from common prefixes the store
//! reports, so they carry no size and no modification time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::client::RawEntry;
use super::paths::DELIMITER;

/// Type reported for folders.
pub const FOLDER_TYPE: &str = "folder";
/// Type reported for files without a usable extension.
pub const UNKNOWN_TYPE: &str = "unknown";

/// An immediate child of a listed folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FolderEntry {
    File {
        /// Name relative to the listed folder.
        name: String,
        #[serde(rename = "sizeBytes")]
        size_bytes: u64,
        #[serde(rename = "lastModified")]
        last_modified: DateTime<Utc>,
        /// Extension-derived type, or `unknown`.
        #[serde(rename = "contentType")]
        content_type: String,
    },
    Folder {
        /// Name relative to the listed folder, ending with `/`.
        name: String,
    },
}

impl FolderEntry {
    pub fn name(&self) -> &str {
        match self {
            FolderEntry::File { name, .. } | FolderEntry::Folder { name } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FolderEntry::Folder { .. })
    }

    /// Zero for folders.
    pub fn size_bytes(&self) -> u64 {
        match self {
            FolderEntry::File { size_bytes, .. } => *size_bytes,
            FolderEntry::Folder { .. } => 0,
        }
    }

    /// `None` for folders.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            FolderEntry::File { last_modified, .. } => Some(*last_modified),
            FolderEntry::Folder { .. } => None,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            FolderEntry::File { content_type, .. } => content_type,
            FolderEntry::Folder { .. } => FOLDER_TYPE,
        }
    }
}

/// Type hint for a key or name.
///
/// Folder names (trailing `/`) are `folder`; otherwise the text after the last
/// `.` of the last segment, unless that dot ends the name.
pub fn extension_of(name: &str) -> &str {
    if name.ends_with(DELIMITER) {
        return FOLDER_TYPE;
    }
    let file_name = name.rsplit(DELIMITER).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() => &file_name[dot + 1..],
        _ => UNKNOWN_TYPE,
    }
}

/// Project a delimited listing of `prefix` into its immediate children.
pub fn project(prefix: &str, entries: impl IntoIterator<Item = RawEntry>) -> Vec<FolderEntry> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let relative = entry.key().strip_prefix(prefix)?;
            if relative.is_empty() {
                // the folder's own marker
                return None;
            }
            match &entry {
                RawEntry::CommonPrefix(_) => Some(FolderEntry::Folder {
                    name: relative.to_string(),
                }),
                RawEntry::Object(_) if relative.contains(DELIMITER) => {
                    tracing::debug!(key = entry.key(), "Dropping nested key from folder view");
                    None
                }
                RawEntry::Object(meta) => Some(FolderEntry::File {
                    name: relative.to_string(),
                    size_bytes: meta.size_bytes,
                    last_modified: meta.last_modified,
                    content_type: extension_of(relative).to_string(),
                }),
            }
        })
        .collect()
}
