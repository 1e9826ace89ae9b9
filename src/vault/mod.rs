//! # Vault API Surface
//!
//! Everything the controller exchanges with Vault: the client traits the
//! reconcilers program against, the HTTP client implementing them, and the
//! typed wire records (one per resource kind) with their mapping, validation,
//! and comparison tables.
//!
//! The reconcilers only ever issue six operations: logical `read`/`write`/
//! `delete` against a computed path, and `get_policy`/`put_policy`/
//! `delete_policy` against the sys backend. Keeping those behind traits keeps
//! the reconcilers testable against mocks.

pub mod aws_role;
pub mod client;
pub mod generic_secret;
pub mod jwt_role;
pub(crate) mod wire;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;

pub use client::{HttpVaultClient, SecretToken, VaultConfig};

/// The flat attribute map Vault exchanges for a path: snake_case keys to
/// untyped JSON values.
pub type VaultData = serde_json::Map<String, serde_json::Value>;

/// Failures at the Vault HTTP client level, before any operation context is
/// attached.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("request to {path:?} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Vault answered with a non-success status. The `errors` list is
    /// Vault's own error envelope, empty when the body was not parseable.
    #[error("Vault returned {status} for {path:?}: {}", .errors.join("; "))]
    Status {
        path: String,
        status: u16,
        errors: Vec<String>,
    },

    /// Vault answered 2xx but the body did not have the expected shape.
    #[error("unexpected response body from {path:?}: {message}")]
    Body { path: String, message: String },
}

/// The standard envelope Vault wraps around logical read responses.
///
/// Only `data` matters to the reconcilers; the lease fields are carried so
/// the client can log them at debug level.
#[derive(Debug, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub lease_id: Option<String>,
    #[serde(default)]
    pub renewable: Option<bool>,
    #[serde(default)]
    pub lease_duration: Option<u64>,
    #[serde(default)]
    pub data: Option<VaultData>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// Logical backend operations: generic attribute maps at arbitrary paths.
///
/// `read` distinguishes "no record at this path" (`Ok(None)`) from a failed
/// call (`Err`); the reconcilers rely on that split to tell absence apart
/// from a transient failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LogicalOps: Send + Sync {
    /// Read the record at `path`. `Ok(None)` means the path holds nothing.
    async fn read(&self, path: &str) -> Result<Option<VaultData>, VaultError>;

    /// Write `data` to `path`, replacing whatever record is there.
    async fn write(&self, path: &str, data: VaultData) -> Result<(), VaultError>;

    /// Delete the record at `path`. Deleting an absent record succeeds.
    async fn delete(&self, path: &str) -> Result<(), VaultError>;
}

/// Sys backend operations for ACL policies, addressed by bare name.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SysOps: Send + Sync {
    /// Fetch the rules of a named policy. `Ok(None)` means no such policy.
    async fn get_policy(&self, name: &str) -> Result<Option<String>, VaultError>;

    /// Create or replace a named policy.
    async fn put_policy(&self, name: &str, rules: &str) -> Result<(), VaultError>;

    /// Delete a named policy. Deleting an absent policy succeeds.
    async fn delete_policy(&self, name: &str) -> Result<(), VaultError>;
}
