// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path parsing and key layout for user-scoped object storage.
//!
//! Every object lives under its owner's namespace:
//!
//! ```text
//! {user_id}/
//!   a.txt                 # file at the namespace root
//!   Documents/
//!     Documents.txt       # sentinel written at account creation
//!     thesis/draft.pdf    # nested file
//! ```
//!
//! The store itself is flat. Folders only exist as shared key prefixes, so the
//! parser below is the single place that decides which keys a request may
//! touch.

use std::fmt;

use thiserror::Error;

/// Separator between key segments.
pub const DELIMITER: char = '/';

/// Characters the object store refuses to keep verbatim in a key segment.
const RESERVED: &[char] = &[
    '\\', '{', '}', '^', '%', '`', '[', ']', '"', '<', '>', '~', '#', '|',
];

/// Reasons a request path cannot become an object key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Nothing left after the `/{verb}/{user_id}/` prefix.
    #[error("path has no remainder after the user segment")]
    MissingRemainder,
    /// The `{user_id}` segment is not a single plain segment.
    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
    /// `a//b`, a leading `/` or a trailing `/`.
    #[error("path contains an empty segment")]
    EmptySegment,
    /// `.` or `..`
    #[error("relative segment '{0}' is not allowed")]
    RelativeSegment(String),
    #[error("segment '{segment}' contains illegal character {character:?}")]
    IllegalCharacter { segment: String, character: char },
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment == "." || segment == ".." {
        return Err(PathError::RelativeSegment(segment.to_string()));
    }
    if let Some(character) = segment
        .chars()
        .find(|c| c.is_control() || RESERVED.contains(c))
    {
        return Err(PathError::IllegalCharacter {
            segment: segment.to_string(),
            character,
        });
    }
    Ok(())
}

/// Validate a relative path and return it in canonical form.
///
/// The canonical form is the input itself: forward-slash separated, no empty
/// segments, no `.`/`..`. Anything else is rejected rather than rewritten so
/// a request can never be silently redirected to another key.
pub fn normalize(path: &str) -> Result<String, PathError> {
    if path.is_empty() {
        return Err(PathError::MissingRemainder);
    }
    for segment in path.split(DELIMITER) {
        check_segment(segment)?;
    }
    Ok(path.to_string())
}

/// Fully qualified key of a single object: `{user_id}/{relative path}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    key: String,
    user_len: usize,
}

impl ObjectKey {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Owner segment of the key.
    pub fn user_id(&self) -> &str {
        &self.key[..self.user_len]
    }

    /// Path below the owner's namespace.
    pub fn relative(&self) -> &str {
        &self.key[self.user_len + 1..]
    }

    /// Last segment, used as the download file name.
    pub fn file_name(&self) -> &str {
        self.key
            .rsplit(DELIMITER)
            .next()
            .unwrap_or(self.key.as_str())
    }

    /// The same key viewed as a folder (`{key}/`).
    pub fn as_folder(&self) -> KeyPrefix {
        KeyPrefix(format!("{}{DELIMITER}", self.key))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// A folder prefix. Always ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix without its trailing delimiter, as the object store addresses it.
    pub fn trimmed(&self) -> &str {
        self.0.trim_end_matches(DELIMITER)
    }

    /// Path of `key` relative to this prefix, if `key` lies below it.
    pub fn strip<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `{user_id}/` namespace all of one user's keys live under.
///
/// Construction only validates the id. HTTP handlers obtain a namespace
/// through [`UserNamespace::authorize`](super::ownership), which also checks
/// the caller owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserNamespace {
    user_id: String,
}

impl UserNamespace {
    pub fn new(user_id: impl Into<String>) -> Result<Self, PathError> {
        let user_id = user_id.into();
        if user_id.contains(DELIMITER) || check_segment(&user_id).is_err() {
            return Err(PathError::InvalidUserId(user_id));
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Root prefix `{user_id}/`.
    pub fn root(&self) -> KeyPrefix {
        KeyPrefix(format!("{}{DELIMITER}", self.user_id))
    }

    /// Resolve the captured remainder of a request path into a key.
    pub fn resolve(&self, rest: &str) -> Result<ObjectKey, PathError> {
        let relative = normalize(rest)?;
        Ok(ObjectKey {
            key: format!("{}{DELIMITER}{relative}", self.user_id),
            user_len: self.user_id.len(),
        })
    }

    /// Prefix of a folder named by a request path, e.g. for recursive delete.
    ///
    /// A single trailing `/` is accepted.
    pub fn folder(&self, rest: &str) -> Result<KeyPrefix, PathError> {
        let rest = rest.strip_suffix(DELIMITER).unwrap_or(rest);
        Ok(self.resolve(rest)?.as_folder())
    }

    /// Listing prefix for an optional `?folder=` query value.
    ///
    /// Blank means the namespace root.
    pub fn folder_prefix(&self, folder: Option<&str>) -> Result<KeyPrefix, PathError> {
        match folder.map(str::trim) {
            None | Some("") => Ok(self.root()),
            Some(folder) => self.folder(folder),
        }
    }
}
