//! # VaultPolicy CRD
//!
//! Declares an ACL policy under `sys/policies/acl/{name}`. The rules are
//! HCL or JSON in Vault's policy language and are stored verbatim; the
//! remote policy is up to date exactly when its rules string matches.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ResourceStatus;

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "vault.microscaler.io",
    version = "v1alpha1",
    kind = "VaultPolicy",
    namespaced,
    status = "ResourceStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".status.vaultPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VaultPolicySpec {
    /// Policy rules in HCL or JSON, stored in Vault verbatim
    pub rules: String,
}
