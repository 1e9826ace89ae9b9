//! # GenericSecret CRD
//!
//! Declares a key/value secret at an arbitrary Vault path, in the style of
//! a KV version 1 store. The payload is given as a JSON document and is
//! written verbatim.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ResourceStatus;

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "vault.microscaler.io",
    version = "v1alpha1",
    kind = "GenericSecret",
    namespaced,
    status = "ResourceStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".status.vaultPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GenericSecretSpec {
    /// Mount path of the KV secret engine (e.g. "secret", "kv")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Path of the secret under the backend, may contain slashes
    /// (e.g. "teams/platform/db-creds"); defaults to the resource name
    #[serde(default)]
    pub path: Option<String>,
    /// Secret payload as a JSON object, written to Vault verbatim
    pub data_json: String,
}

fn default_backend() -> String {
    "secret".to_string()
}
