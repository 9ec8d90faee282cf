// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication for the file storage API.
//!
//! ## Auth Flow
//!
//! 1. The account service issues an HMAC-signed JWT at login
//! 2. Clients send `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Verifies signature, expiry and (if configured) issuer
//!    - Maps `sub` to the canonical `user_id`
//! 4. Handlers check that `user_id` owns the namespace in the request path
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - Without `AUTH_JWT_SECRET` requests are rejected unless built with `dev`

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
