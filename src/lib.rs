// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DMS File Storage - Per-User Folders over Object Storage
//!
//! This crate serves each user a private folder hierarchy backed by a flat
//! object store (Azure Blob Storage in production).
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token authentication
//! - `config` - Environment configuration
//! - `storage` - Key resolution, object store access and folder views

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
pub mod storage;
