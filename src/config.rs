// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! typed configuration loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind IP (IPv4 or IPv6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `STORAGE_BACKEND` | `azure`, `local` or `memory` | `azure` |
//! | `STORAGE_CONNECTION_STRING` | Azure Storage connection string | Required for `azure` |
//! | `STORAGE_CONTAINER` | Container (bucket) holding all user files | `student-files` |
//! | `STORAGE_LOCAL_ROOT` | Parent directory of the container for `local` | `./data` |
//! | `AUTH_JWT_SECRET` | HMAC secret used to verify bearer tokens | Required for production |
//! | `AUTH_JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
pub const STORAGE_CONNECTION_STRING_ENV: &str = "STORAGE_CONNECTION_STRING";
pub const STORAGE_CONTAINER_ENV: &str = "STORAGE_CONTAINER";
pub const STORAGE_LOCAL_ROOT_ENV: &str = "STORAGE_LOCAL_ROOT";
pub const AUTH_JWT_SECRET_ENV: &str = "AUTH_JWT_SECRET";
pub const AUTH_JWT_ISSUER_ENV: &str = "AUTH_JWT_ISSUER";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONTAINER: &str = "student-files";
pub const DEFAULT_LOCAL_ROOT: &str = "./data";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors, reported before the server starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which object store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Azure Blob Storage.
    Azure,
    /// A directory on the local filesystem.
    Local,
    /// Process memory; contents vanish on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azure" => Ok(StorageBackend::Azure),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: STORAGE_BACKEND_ENV,
                reason: format!("unknown backend '{other}' (expected azure, local or memory)"),
            }),
        }
    }
}

/// Parsed Azure Storage connection string.
///
/// Only the keys the blob client needs are kept; others (`QueueEndpoint`,
/// `EndpointSuffix`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AzureConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub shared_access_signature: Option<String>,
    pub use_development_storage: bool,
}

impl AzureConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. Values may themselves contain `=`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let pairs: HashMap<String, String> = raw
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .ok_or_else(|| ConfigError::Invalid {
                        name: STORAGE_CONNECTION_STRING_ENV,
                        reason: format!("segment '{part}' is not Key=Value"),
                    })
            })
            .collect::<Result<_, _>>()?;

        let parsed = Self {
            account_name: pairs.get("AccountName").cloned(),
            account_key: pairs.get("AccountKey").cloned(),
            blob_endpoint: pairs.get("BlobEndpoint").cloned(),
            shared_access_signature: pairs.get("SharedAccessSignature").cloned(),
            use_development_storage: pairs
                .get("UseDevelopmentStorage")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        };

        if let Some(endpoint) = &parsed.blob_endpoint {
            url::Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
                name: STORAGE_CONNECTION_STRING_ENV,
                reason: format!("BlobEndpoint: {e}"),
            })?;
        }

        if !parsed.use_development_storage && parsed.account_name.is_none() {
            return Err(ConfigError::Invalid {
                name: STORAGE_CONNECTION_STRING_ENV,
                reason: "AccountName is required".to_string(),
            });
        }
        if !parsed.use_development_storage
            && parsed.account_key.is_none()
            && parsed.shared_access_signature.is_none()
        {
            return Err(ConfigError::Invalid {
                name: STORAGE_CONNECTION_STRING_ENV,
                reason: "AccountKey or SharedAccessSignature is required".to_string(),
            });
        }

        Ok(parsed)
    }

    /// SAS token as query pairs.
    pub fn sas_pairs(&self) -> Option<Vec<(String, String)>> {
        self.shared_access_signature.as_ref().map(|sas| {
            url::form_urlencoded::parse(sas.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect()
        })
    }
}

/// Object store settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub container: String,
    pub local_root: PathBuf,
    pub azure: Option<AzureConnectionString>,
}

impl StorageConfig {
    /// In-memory storage, for tests and demos.
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            container: DEFAULT_CONTAINER.to_string(),
            local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            azure: None,
        }
    }
}

/// Bearer token verification settings.
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub auth: AuthSettings,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        // Bare IP literal, so IPv6 hosts like `::` need no brackets
        let ip = host.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
            name: HOST_ENV,
            reason: e.to_string(),
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let backend = match get(STORAGE_BACKEND_ENV) {
            Some(value) => value.parse()?,
            None => StorageBackend::Azure,
        };
        let azure = match get(STORAGE_CONNECTION_STRING_ENV) {
            Some(raw) => Some(AzureConnectionString::parse(&raw)?),
            None if backend == StorageBackend::Azure => {
                return Err(ConfigError::Missing(STORAGE_CONNECTION_STRING_ENV))
            }
            None => None,
        };

        let storage = StorageConfig {
            backend,
            container: get(STORAGE_CONTAINER_ENV).unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
            local_root: PathBuf::from(
                get(STORAGE_LOCAL_ROOT_ENV).unwrap_or_else(|| DEFAULT_LOCAL_ROOT.to_string()),
            ),
            azure,
        };

        let auth = AuthSettings {
            jwt_secret: get(AUTH_JWT_SECRET_ENV),
            issuer: get(AUTH_JWT_ISSUER_ENV),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            storage,
            auth,
            log_format,
        })
    }
}
