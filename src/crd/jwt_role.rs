//! # JwtRole CRD
//!
//! Declares a role on a JWT/OIDC auth backend. The field set mirrors the
//! Vault API for `auth/{backend}/role/{name}`; absent fields fall back to
//! Vault's own defaults.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ResourceStatus;

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "vault.microscaler.io",
    version = "v1alpha1",
    kind = "JwtRole",
    namespaced,
    status = "ResourceStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".status.vaultPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JwtRoleSpec {
    /// Mount path of the JWT/OIDC auth backend, without the `auth/` prefix
    /// (e.g. "jwt", "gitlab", "oidc/azure")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Vault Enterprise namespace the role belongs to
    #[serde(default)]
    pub namespace: Option<String>,
    /// Role type: "jwt" or "oidc"
    #[serde(default = "default_role_type")]
    pub role_type: String,
    /// Audiences the `aud` claim must match at least one of
    #[serde(default)]
    pub bound_audiences: Option<Vec<String>>,
    /// Claim to use as the identity alias name (e.g. "sub")
    #[serde(default)]
    pub user_claim: Option<String>,
    /// Interpret user_claim as a JSON pointer into the token
    #[serde(default)]
    pub user_claim_json_pointer: Option<bool>,
    /// Value the `sub` claim must equal exactly
    #[serde(default)]
    pub bound_subject: Option<String>,
    /// Claims that must be present in the token with matching values
    #[serde(default)]
    pub bound_claims: Option<BTreeMap<String, String>>,
    /// How bound_claims values are matched: "string" or "glob"
    #[serde(default = "default_bound_claims_type")]
    pub bound_claims_type: String,
    /// Token claims to copy onto the resulting identity alias metadata
    #[serde(default)]
    pub claim_mappings: Option<BTreeMap<String, String>>,
    /// OIDC scopes to request (oidc roles only)
    #[serde(default)]
    pub oidc_scopes: Option<Vec<String>>,
    /// Claim containing the groups the user belongs to
    #[serde(default)]
    pub groups_claim: Option<String>,
    /// Redirect URIs allowed in the OIDC authorization flow
    #[serde(default)]
    pub allowed_redirect_uris: Option<Vec<String>>,
    /// Seconds of clock skew tolerated when validating claims (jwt roles only)
    #[serde(default)]
    pub clock_skew_leeway: Option<i64>,
    /// Seconds past `exp` a token is still accepted (jwt roles only)
    #[serde(default)]
    pub expiration_leeway: Option<i64>,
    /// Seconds before `nbf` a token is already accepted (jwt roles only)
    #[serde(default)]
    pub not_before_leeway: Option<i64>,
    /// Log received OIDC tokens for debugging; never enable in production
    #[serde(default)]
    pub verbose_oidc_logging: Option<bool>,
    /// Maximum age in seconds of the user's authentication (oidc roles only)
    #[serde(default)]
    pub max_age: Option<i64>,
    /// Initial TTL in seconds of tokens issued through this role
    #[serde(default)]
    pub token_ttl: Option<i64>,
    /// Maximum TTL in seconds after renewals
    #[serde(default)]
    pub token_max_ttl: Option<i64>,
    /// Policies attached to issued tokens
    #[serde(default)]
    pub token_policies: Option<Vec<String>>,
    /// CIDR blocks issued tokens may be used from
    #[serde(default)]
    pub token_bound_cidrs: Option<Vec<String>>,
    /// Hard TTL cap in seconds, overriding mount and system maximums
    #[serde(default)]
    pub token_explicit_max_ttl: Option<i64>,
    /// Do not attach the `default` policy to issued tokens
    #[serde(default)]
    pub token_no_default_policy: Option<bool>,
    /// Number of uses before an issued token expires; 0 for unlimited
    #[serde(default)]
    pub token_num_uses: Option<i64>,
    /// Period in seconds for periodic tokens
    #[serde(default)]
    pub token_period: Option<i64>,
    /// Token type: "service", "batch" or "default"
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_backend() -> String {
    "jwt".to_string()
}

fn default_role_type() -> String {
    "oidc".to_string()
}

fn default_bound_claims_type() -> String {
    "string".to_string()
}

fn default_token_type() -> String {
    "default".to_string()
}
