//! # Vault HTTP Client
//!
//! A thin client over Vault's HTTP API implementing [`LogicalOps`] and
//! [`SysOps`]. Logical paths map to `{addr}/v1/{path}`; policies live under
//! `sys/policies/acl/{name}` with the rules carried in the `policy` field.
//!
//! Status mapping follows Vault's conventions: a 404 on a read means "no
//! record here" and surfaces as `Ok(None)`; 404 on a write or delete means
//! the mount itself is missing and is surfaced as an error (Vault answers
//! 204 when deleting a key that does not exist, so delete idempotency does
//! not need client-side help).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{LogicalOps, SysOps, VaultData, VaultError, VaultResponse};
use crate::error::Error;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
const REQUEST_HEADER: &str = "X-Vault-Request";

/// A Vault token that is wiped from memory when dropped and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

/// Connection settings for the Vault server, normally taken from the
/// standard `VAULT_*` environment.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Base address, e.g. `https://vault.example.com:8200`.
    pub address: String,
    /// Static client token.
    pub token: SecretToken,
    /// Optional Vault Enterprise namespace, sent as `X-Vault-Namespace`.
    pub namespace: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl VaultConfig {
    /// Read the connection settings from `VAULT_ADDR`, `VAULT_TOKEN`,
    /// `VAULT_NAMESPACE`, and `VAULT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| Error::config("VAULT_ADDR is not set"))?;
        let token = std::env::var("VAULT_TOKEN")
            .map_err(|_| Error::config("VAULT_TOKEN is not set"))?;
        let namespace = std::env::var("VAULT_NAMESPACE")
            .ok()
            .filter(|ns| !ns.is_empty());
        let timeout_secs = match std::env::var("VAULT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| Error::config(format!("VAULT_TIMEOUT_SECS is not a number: {raw:?}")))?,
            Err(_) => 30,
        };
        Ok(Self {
            address,
            token: SecretToken::new(token),
            namespace,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Client for a single Vault server. Cheap to clone is not a goal; the
/// controller holds it in an `Arc` behind the client traits.
#[derive(Debug)]
pub struct HttpVaultClient {
    http: reqwest::Client,
    address: String,
    token: SecretToken,
    namespace: Option<String>,
}

impl HttpVaultClient {
    pub fn new(config: VaultConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("cannot build Vault HTTP client: {e}")))?;
        Ok(Self {
            http,
            address: config.address.trim_end_matches('/').to_string(),
            token: config.token,
            namespace: config.namespace,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path)
    }

    fn headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header(TOKEN_HEADER, self.token.as_str())
            .header(REQUEST_HEADER, "true");
        match &self.namespace {
            Some(ns) => builder.header(NAMESPACE_HEADER, ns),
            None => builder,
        }
    }

    /// Send a request, surfacing every non-success status as an error.
    async fn execute(&self, builder: RequestBuilder, path: &str) -> Result<Response, VaultError> {
        match self.execute_optional(builder, path).await? {
            Some(response) => Ok(response),
            None => Err(VaultError::Status {
                path: path.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
                errors: Vec::new(),
            }),
        }
    }

    /// Send a request, mapping 404 to `Ok(None)`.
    async fn execute_optional(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<Option<Response>, VaultError> {
        let response = builder.send().await.map_err(|source| VaultError::Transport {
            path: path.to_string(),
            source,
        })?;
        let status = response.status();
        debug!(%path, status = status.as_u16(), "vault request completed");
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let errors = match response.text().await {
                Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                    .map(|parsed| parsed.errors)
                    .unwrap_or_default(),
                Err(_) => Vec::new(),
            };
            return Err(VaultError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                errors,
            });
        }
        Ok(Some(response))
    }

    async fn parse_envelope(response: Response, path: &str) -> Result<VaultResponse, VaultError> {
        response
            .json::<VaultResponse>()
            .await
            .map_err(|e| VaultError::Body {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    fn policy_path(name: &str) -> String {
        format!("sys/policies/acl/{name}")
    }
}

#[async_trait]
impl LogicalOps for HttpVaultClient {
    async fn read(&self, path: &str) -> Result<Option<VaultData>, VaultError> {
        let request = self.headers(self.http.get(self.endpoint(path)));
        let Some(response) = self.execute_optional(request, path).await? else {
            return Ok(None);
        };
        let envelope = Self::parse_envelope(response, path).await?;
        if let Some(warnings) = &envelope.warnings {
            if !warnings.is_empty() {
                debug!(%path, ?warnings, "vault returned warnings");
            }
        }
        Ok(Some(envelope.data.unwrap_or_default()))
    }

    async fn write(&self, path: &str, data: VaultData) -> Result<(), VaultError> {
        let request = self.headers(self.http.put(self.endpoint(path))).json(&data);
        self.execute(request, path).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), VaultError> {
        let request = self.headers(self.http.delete(self.endpoint(path)));
        self.execute(request, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SysOps for HttpVaultClient {
    async fn get_policy(&self, name: &str) -> Result<Option<String>, VaultError> {
        let path = Self::policy_path(name);
        let request = self.headers(self.http.get(self.endpoint(&path)));
        let Some(response) = self.execute_optional(request, &path).await? else {
            return Ok(None);
        };
        let envelope = Self::parse_envelope(response, &path).await?;
        let rules = envelope
            .data
            .as_ref()
            .and_then(|data| data.get("policy"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| VaultError::Body {
                path: path.clone(),
                message: "missing policy field".to_string(),
            })?;
        Ok(Some(rules.to_string()))
    }

    async fn put_policy(&self, name: &str, rules: &str) -> Result<(), VaultError> {
        let path = Self::policy_path(name);
        let request = self
            .headers(self.http.put(self.endpoint(&path)))
            .json(&serde_json::json!({ "policy": rules }));
        self.execute(request, &path).await?;
        Ok(())
    }

    async fn delete_policy(&self, name: &str) -> Result<(), VaultError> {
        let path = Self::policy_path(name);
        let request = self.headers(self.http.delete(self.endpoint(&path)));
        self.execute(request, &path).await?;
        Ok(())
    }
}
