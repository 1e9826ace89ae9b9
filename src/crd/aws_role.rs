//! # AwsRole CRD
//!
//! Declares a role on an AWS secret engine. The field set mirrors the Vault
//! API for `{backend}/roles/{name}`; which fields are applicable depends on
//! the credential type, and the controller rejects invalid combinations
//! before writing.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ResourceStatus;

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "vault.microscaler.io",
    version = "v1alpha1",
    kind = "AwsRole",
    namespaced,
    status = "ResourceStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".status.vaultPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AwsRoleSpec {
    /// Mount path of the AWS secret engine (e.g. "aws", "aws-master")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Credential type Vault generates for this role:
    /// "iam_user", "assumed_role" or "federation_token"
    pub credential_type: String,
    /// ARNs of AWS roles to assume (assumed_role only)
    #[serde(default)]
    pub role_arns: Option<Vec<String>>,
    /// ARNs of managed IAM policies to attach
    #[serde(default)]
    pub policy_arns: Option<Vec<String>>,
    /// Inline IAM policy document in JSON
    #[serde(default)]
    pub policy_document: Option<String>,
    /// IAM groups generated users are added to (iam_user only)
    #[serde(default)]
    pub iam_groups: Option<Vec<String>>,
    /// IAM path for generated users (iam_user only, default "/")
    #[serde(default)]
    pub user_path: Option<String>,
    /// Permissions boundary ARN attached to generated users (iam_user only)
    #[serde(default)]
    pub permissions_boundary_arn: Option<String>,
    /// Default TTL in seconds for STS credentials
    /// (assumed_role and federation_token only)
    #[serde(default)]
    pub default_sts_ttl: Option<i64>,
    /// Maximum TTL in seconds for STS credentials
    /// (assumed_role and federation_token only)
    #[serde(default)]
    pub max_sts_ttl: Option<i64>,
}

fn default_backend() -> String {
    "aws".to_string()
}
