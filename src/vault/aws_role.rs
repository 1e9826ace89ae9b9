//! # AWS Secret Engine Role Record
//!
//! Typed wire record for roles under an AWS secret backend
//! (`{backend}/roles/{name}`). Unlike the JWT/OIDC auth endpoint, the AWS
//! endpoint rejects parameter combinations that do not suit the credential
//! type, so the write payload only carries keys that are actually set and
//! `validate` enforces the per-credential-type rules before any write.
//!
//! `role_name` and `backend` locate the role and ride along in the payload
//! uninterpreted; they are excluded from the comparison table.

use super::{wire, VaultData};
use crate::crd::AwsRoleSpec;
use crate::error::Error;

const KIND: &str = "AwsRole";

const ROLE_NAME: &str = "role_name";
const BACKEND: &str = "backend";
const CREDENTIAL_TYPE: &str = "credential_type";
const ROLE_ARNS: &str = "role_arns";
const POLICY_ARNS: &str = "policy_arns";
const POLICY_DOCUMENT: &str = "policy_document";
const IAM_GROUPS: &str = "iam_groups";
const USER_PATH: &str = "user_path";
const PERMISSIONS_BOUNDARY_ARN: &str = "permissions_boundary_arn";
const DEFAULT_STS_TTL: &str = "default_sts_ttl";
const MAX_STS_TTL: &str = "max_sts_ttl";

/// `credential_type` values Vault accepts for this endpoint.
pub const CREDENTIAL_TYPE_IAM_USER: &str = "iam_user";
pub const CREDENTIAL_TYPE_ASSUMED_ROLE: &str = "assumed_role";
pub const CREDENTIAL_TYPE_FEDERATION_TOKEN: &str = "federation_token";

const CREDENTIAL_TYPES: &[&str] = &[
    CREDENTIAL_TYPE_IAM_USER,
    CREDENTIAL_TYPE_ASSUMED_ROLE,
    CREDENTIAL_TYPE_FEDERATION_TOKEN,
];

/// IAM users are created under this path when the spec does not name one.
const DEFAULT_USER_PATH: &str = "/";

/// Desired or observed state of one AWS secret engine role, in Vault's own
/// field vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsRoleRecord {
    pub role_name: String,
    pub backend: String,
    pub credential_type: String,
    pub role_arns: Vec<String>,
    pub policy_arns: Vec<String>,
    pub policy_document: String,
    pub iam_groups: Vec<String>,
    pub user_path: String,
    pub permissions_boundary_arn: String,
    pub default_sts_ttl: i64,
    pub max_sts_ttl: i64,
}

impl AwsRoleRecord {
    /// Build the desired record from a spec. `iam_user` roles get Vault's
    /// `user_path` default filled in so the record compares equal to what a
    /// default write reads back.
    pub fn from_params(name: &str, spec: &AwsRoleSpec) -> Self {
        let mut user_path = spec.user_path.clone().unwrap_or_default();
        if spec.credential_type == CREDENTIAL_TYPE_IAM_USER && user_path.is_empty() {
            user_path = DEFAULT_USER_PATH.to_string();
        }
        Self {
            role_name: name.to_string(),
            backend: spec.backend.clone(),
            credential_type: spec.credential_type.clone(),
            role_arns: spec.role_arns.clone().unwrap_or_default(),
            policy_arns: spec.policy_arns.clone().unwrap_or_default(),
            policy_document: spec.policy_document.clone().unwrap_or_default(),
            iam_groups: spec.iam_groups.clone().unwrap_or_default(),
            user_path,
            permissions_boundary_arn: spec.permissions_boundary_arn.clone().unwrap_or_default(),
            default_sts_ttl: spec.default_sts_ttl.unwrap_or(0),
            max_sts_ttl: spec.max_sts_ttl.unwrap_or(0),
        }
    }

    /// Decode a record read back from Vault. Unknown keys are ignored;
    /// missing or null keys decode to zero values; a value of the wrong
    /// kind aborts the decode.
    pub fn from_wire(path: &str, data: &VaultData) -> Result<Self, Error> {
        Ok(Self {
            role_name: wire::string_field(path, data, ROLE_NAME)?,
            backend: wire::string_field(path, data, BACKEND)?,
            credential_type: wire::string_field(path, data, CREDENTIAL_TYPE)?,
            role_arns: wire::string_list_field(path, data, ROLE_ARNS)?,
            policy_arns: wire::string_list_field(path, data, POLICY_ARNS)?,
            policy_document: wire::string_field(path, data, POLICY_DOCUMENT)?,
            iam_groups: wire::string_list_field(path, data, IAM_GROUPS)?,
            user_path: wire::string_field(path, data, USER_PATH)?,
            permissions_boundary_arn: wire::string_field(path, data, PERMISSIONS_BOUNDARY_ARN)?,
            default_sts_ttl: wire::int_field(path, data, DEFAULT_STS_TTL)?,
            max_sts_ttl: wire::int_field(path, data, MAX_STS_TTL)?,
        })
    }

    /// Render the write payload. Identification keys and `credential_type`
    /// are always present; every other key is omitted when empty or zero so
    /// Vault never sees a parameter that is inapplicable to the credential
    /// type.
    pub fn to_wire(&self) -> VaultData {
        let mut data = VaultData::new();
        wire::put_string(&mut data, ROLE_NAME, &self.role_name);
        wire::put_string(&mut data, BACKEND, &self.backend);
        wire::put_string(&mut data, CREDENTIAL_TYPE, &self.credential_type);
        if !self.role_arns.is_empty() {
            wire::put_string_list(&mut data, ROLE_ARNS, &self.role_arns);
        }
        if !self.policy_arns.is_empty() {
            wire::put_string_list(&mut data, POLICY_ARNS, &self.policy_arns);
        }
        if !self.policy_document.is_empty() {
            wire::put_string(&mut data, POLICY_DOCUMENT, &self.policy_document);
        }
        if !self.iam_groups.is_empty() {
            wire::put_string_list(&mut data, IAM_GROUPS, &self.iam_groups);
        }
        if !self.user_path.is_empty() {
            wire::put_string(&mut data, USER_PATH, &self.user_path);
        }
        if !self.permissions_boundary_arn.is_empty() {
            wire::put_string(&mut data, PERMISSIONS_BOUNDARY_ARN, &self.permissions_boundary_arn);
        }
        if self.default_sts_ttl != 0 {
            wire::put_int(&mut data, DEFAULT_STS_TTL, self.default_sts_ttl);
        }
        if self.max_sts_ttl != 0 {
            wire::put_int(&mut data, MAX_STS_TTL, self.max_sts_ttl);
        }
        data
    }

    /// Cross-field constraints the AWS endpoint enforces server-side,
    /// checked here before any write.
    pub fn validate(&self) -> Result<(), Error> {
        if !CREDENTIAL_TYPES.contains(&self.credential_type.as_str()) {
            return Err(Error::validation(
                KIND,
                &self.role_name,
                format!(
                    "credential_type must be one of iam_user, assumed_role, federation_token; got {:?}",
                    self.credential_type
                ),
            ));
        }
        if self.policy_document.is_empty()
            && self.policy_arns.is_empty()
            && self.role_arns.is_empty()
            && self.iam_groups.is_empty()
        {
            return Err(Error::validation(
                KIND,
                &self.role_name,
                "at least one of policy_document, policy_arns, role_arns, iam_groups must be set",
            ));
        }
        if self.credential_type != CREDENTIAL_TYPE_IAM_USER {
            if !self.user_path.is_empty() {
                return Err(Error::validation(
                    KIND,
                    &self.role_name,
                    "user_path is only applicable for iam_user credential type",
                ));
            }
            if !self.permissions_boundary_arn.is_empty() {
                return Err(Error::validation(
                    KIND,
                    &self.role_name,
                    "permissions_boundary_arn is only applicable for iam_user credential type",
                ));
            }
        }
        if self.credential_type == CREDENTIAL_TYPE_IAM_USER {
            for (key, value) in [
                (DEFAULT_STS_TTL, self.default_sts_ttl),
                (MAX_STS_TTL, self.max_sts_ttl),
            ] {
                if value != 0 {
                    return Err(Error::validation(
                        KIND,
                        &self.role_name,
                        format!(
                            "{key} is only applicable for assumed_role or federation_token credential types"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

type FieldEq = fn(&AwsRoleRecord, &AwsRoleRecord) -> bool;

/// Comparison table: every configured field of the role, with `role_name`
/// and `backend` deliberately absent.
const COMPARED_FIELDS: &[(&str, FieldEq)] = &[
    (CREDENTIAL_TYPE, |d, a| d.credential_type == a.credential_type),
    (ROLE_ARNS, |d, a| d.role_arns == a.role_arns),
    (POLICY_ARNS, |d, a| d.policy_arns == a.policy_arns),
    (POLICY_DOCUMENT, |d, a| d.policy_document == a.policy_document),
    (IAM_GROUPS, |d, a| d.iam_groups == a.iam_groups),
    (USER_PATH, |d, a| d.user_path == a.user_path),
    (PERMISSIONS_BOUNDARY_ARN, |d, a| {
        d.permissions_boundary_arn == a.permissions_boundary_arn
    }),
    (DEFAULT_STS_TTL, |d, a| d.default_sts_ttl == a.default_sts_ttl),
    (MAX_STS_TTL, |d, a| d.max_sts_ttl == a.max_sts_ttl),
];

/// Name of the first field where the remote role deviates from the desired
/// record, for debug logging. `None` means the role is up to date.
pub fn first_difference(desired: &AwsRoleRecord, actual: &AwsRoleRecord) -> Option<&'static str> {
    COMPARED_FIELDS
        .iter()
        .find(|(_, field_eq)| !field_eq(desired, actual))
        .map(|(name, _)| *name)
}

pub fn up_to_date(desired: &AwsRoleRecord, actual: &AwsRoleRecord) -> bool {
    first_difference(desired, actual).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn spec_from(value: Value) -> AwsRoleSpec {
        serde_json::from_value(value).expect("valid spec json")
    }

    fn wire_map(value: Value) -> VaultData {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn iam_user_spec() -> AwsRoleSpec {
        spec_from(json!({
            "credentialType": "iam_user",
            "policyArns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"]
        }))
    }

    fn assumed_role_spec() -> AwsRoleSpec {
        spec_from(json!({
            "backend": "aws-master",
            "credentialType": "assumed_role",
            "roleArns": ["arn:aws:iam::123456789012:role/deploy"],
            "policyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[]}",
            "defaultStsTtl": 900,
            "maxStsTtl": 3600
        }))
    }

    #[test]
    fn iam_user_payload_omits_unset_keys_and_defaults_user_path() {
        let record = AwsRoleRecord::from_params("readonly", &iam_user_spec());
        let expected = wire_map(json!({
            "role_name": "readonly",
            "backend": "aws",
            "credential_type": "iam_user",
            "policy_arns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"],
            "user_path": "/"
        }));
        assert_eq!(record.to_wire(), expected);
    }

    #[test]
    fn explicit_user_path_is_preserved() {
        let record = AwsRoleRecord::from_params(
            "readonly",
            &spec_from(json!({
                "credentialType": "iam_user",
                "policyArns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"],
                "userPath": "/service-accounts/"
            })),
        );
        assert_eq!(record.user_path, "/service-accounts/");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn assumed_role_payload_round_trips() {
        let desired = AwsRoleRecord::from_params("deploy", &assumed_role_spec());
        let decoded =
            AwsRoleRecord::from_wire("aws-master/roles/deploy", &desired.to_wire()).unwrap();
        assert_eq!(decoded, desired);
    }

    #[test]
    fn assumed_role_payload_has_no_user_path() {
        let record = AwsRoleRecord::from_params("deploy", &assumed_role_spec());
        assert!(!record.to_wire().contains_key("user_path"));
    }

    #[test]
    fn from_wire_coerces_float_ttls() {
        let data = wire_map(json!({
            "credential_type": "assumed_role",
            "role_arns": ["arn:aws:iam::123456789012:role/deploy"],
            "default_sts_ttl": 900.0,
            "max_sts_ttl": "3600"
        }));
        let record = AwsRoleRecord::from_wire("aws/roles/deploy", &data).unwrap();
        assert_eq!(record.default_sts_ttl, 900);
        assert_eq!(record.max_sts_ttl, 3600);
    }

    #[test]
    fn unknown_credential_type_is_rejected() {
        let record =
            AwsRoleRecord::from_params("r", &spec_from(json!({"credentialType": "session"})));
        let err = record.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("credential_type must be one of iam_user, assumed_role, federation_token"));
    }

    #[test]
    fn role_without_any_policy_source_is_rejected() {
        let record =
            AwsRoleRecord::from_params("r", &spec_from(json!({"credentialType": "iam_user"})));
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains(
            "at least one of policy_document, policy_arns, role_arns, iam_groups must be set"
        ));
    }

    #[test]
    fn user_path_is_rejected_for_assumed_role() {
        let record = AwsRoleRecord::from_params(
            "deploy",
            &spec_from(json!({
                "credentialType": "assumed_role",
                "roleArns": ["arn:aws:iam::123456789012:role/deploy"],
                "userPath": "/service-accounts/"
            })),
        );
        let err = record.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("user_path is only applicable for iam_user credential type"));
    }

    #[test]
    fn permissions_boundary_is_rejected_for_federation_token() {
        let record = AwsRoleRecord::from_params(
            "federated",
            &spec_from(json!({
                "credentialType": "federation_token",
                "policyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[]}",
                "permissionsBoundaryArn": "arn:aws:iam::123456789012:policy/boundary"
            })),
        );
        let err = record.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("permissions_boundary_arn is only applicable for iam_user credential type"));
    }

    #[test]
    fn sts_ttls_are_rejected_for_iam_user() {
        let record = AwsRoleRecord::from_params(
            "readonly",
            &spec_from(json!({
                "credentialType": "iam_user",
                "policyArns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"],
                "maxStsTtl": 3600
            })),
        );
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains(
            "max_sts_ttl is only applicable for assumed_role or federation_token credential types"
        ));
    }

    #[test]
    fn records_differing_only_in_name_and_backend_are_up_to_date() {
        let desired = AwsRoleRecord::from_params("deploy", &assumed_role_spec());
        let mut actual = desired.clone();
        actual.role_name = "other-name".to_string();
        actual.backend = "other-backend".to_string();
        assert!(up_to_date(&desired, &actual));
    }

    #[test]
    fn policy_document_drift_is_detected() {
        let desired = AwsRoleRecord::from_params("deploy", &assumed_role_spec());
        let mut actual = desired.clone();
        actual.policy_document = "{}".to_string();
        assert!(!up_to_date(&desired, &actual));
        assert_eq!(first_difference(&desired, &actual), Some("policy_document"));
    }
}
