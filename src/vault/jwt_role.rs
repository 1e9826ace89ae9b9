//! # JWT/OIDC Auth Role Record
//!
//! Typed wire record for roles under a JWT/OIDC auth backend
//! (`auth/{backend}/role/{name}`). The record carries every key the Vault
//! API documents for the endpoint; writes always send the full key set with
//! zero defaults filled in, which is what Vault itself stores, so a freshly
//! written role reads back equal to the record that produced it.
//!
//! `role_name` and `namespace` locate the role rather than configure it;
//! Vault reports them back uninterpreted and they are excluded from the
//! comparison table.

use std::collections::BTreeMap;

use super::{wire, VaultData};
use crate::crd::JwtRoleSpec;
use crate::error::Error;

const KIND: &str = "JwtRole";

const ROLE_NAME: &str = "role_name";
const NAMESPACE: &str = "namespace";
const ROLE_TYPE: &str = "role_type";
const BOUND_AUDIENCES: &str = "bound_audiences";
const USER_CLAIM: &str = "user_claim";
const USER_CLAIM_JSON_POINTER: &str = "user_claim_json_pointer";
const BOUND_SUBJECT: &str = "bound_subject";
const BOUND_CLAIMS: &str = "bound_claims";
const BOUND_CLAIMS_TYPE: &str = "bound_claims_type";
const CLAIM_MAPPINGS: &str = "claim_mappings";
const OIDC_SCOPES: &str = "oidc_scopes";
const GROUPS_CLAIM: &str = "groups_claim";
const ALLOWED_REDIRECT_URIS: &str = "allowed_redirect_uris";
const CLOCK_SKEW_LEEWAY: &str = "clock_skew_leeway";
const EXPIRATION_LEEWAY: &str = "expiration_leeway";
const NOT_BEFORE_LEEWAY: &str = "not_before_leeway";
const VERBOSE_OIDC_LOGGING: &str = "verbose_oidc_logging";
const MAX_AGE: &str = "max_age";
const TOKEN_TTL: &str = "token_ttl";
const TOKEN_MAX_TTL: &str = "token_max_ttl";
const TOKEN_POLICIES: &str = "token_policies";
const TOKEN_BOUND_CIDRS: &str = "token_bound_cidrs";
const TOKEN_EXPLICIT_MAX_TTL: &str = "token_explicit_max_ttl";
const TOKEN_NO_DEFAULT_POLICY: &str = "token_no_default_policy";
const TOKEN_NUM_USES: &str = "token_num_uses";
const TOKEN_PERIOD: &str = "token_period";
const TOKEN_TYPE: &str = "token_type";

/// `role_type` values Vault accepts for this endpoint.
pub const ROLE_TYPE_JWT: &str = "jwt";
pub const ROLE_TYPE_OIDC: &str = "oidc";

const ROLE_TYPES: &[&str] = &[ROLE_TYPE_JWT, ROLE_TYPE_OIDC];
const BOUND_CLAIMS_TYPES: &[&str] = &["string", "glob"];
const TOKEN_TYPES: &[&str] = &["service", "batch", "default"];

/// Desired or observed state of one JWT/OIDC auth role, in Vault's own
/// field vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtRoleRecord {
    pub role_name: String,
    pub namespace: String,
    pub role_type: String,
    pub bound_audiences: Vec<String>,
    pub user_claim: String,
    pub user_claim_json_pointer: bool,
    pub bound_subject: String,
    pub bound_claims: BTreeMap<String, String>,
    pub bound_claims_type: String,
    pub claim_mappings: BTreeMap<String, String>,
    pub oidc_scopes: Vec<String>,
    pub groups_claim: String,
    pub allowed_redirect_uris: Vec<String>,
    pub clock_skew_leeway: i64,
    pub expiration_leeway: i64,
    pub not_before_leeway: i64,
    pub verbose_oidc_logging: bool,
    pub max_age: i64,
    pub token_ttl: i64,
    pub token_max_ttl: i64,
    pub token_policies: Vec<String>,
    pub token_bound_cidrs: Vec<String>,
    pub token_explicit_max_ttl: i64,
    pub token_no_default_policy: bool,
    pub token_num_uses: i64,
    pub token_period: i64,
    pub token_type: String,
}

impl JwtRoleRecord {
    /// Build the desired record from a spec, filling Vault's documented
    /// zero defaults for every absent optional field.
    pub fn from_params(name: &str, spec: &JwtRoleSpec) -> Self {
        Self {
            role_name: name.to_string(),
            namespace: spec.namespace.clone().unwrap_or_default(),
            role_type: spec.role_type.clone(),
            bound_audiences: spec.bound_audiences.clone().unwrap_or_default(),
            user_claim: spec.user_claim.clone().unwrap_or_default(),
            user_claim_json_pointer: spec.user_claim_json_pointer.unwrap_or(false),
            bound_subject: spec.bound_subject.clone().unwrap_or_default(),
            bound_claims: spec.bound_claims.clone().unwrap_or_default(),
            bound_claims_type: spec.bound_claims_type.clone(),
            claim_mappings: spec.claim_mappings.clone().unwrap_or_default(),
            oidc_scopes: spec.oidc_scopes.clone().unwrap_or_default(),
            groups_claim: spec.groups_claim.clone().unwrap_or_default(),
            allowed_redirect_uris: spec.allowed_redirect_uris.clone().unwrap_or_default(),
            clock_skew_leeway: spec.clock_skew_leeway.unwrap_or(0),
            expiration_leeway: spec.expiration_leeway.unwrap_or(0),
            not_before_leeway: spec.not_before_leeway.unwrap_or(0),
            verbose_oidc_logging: spec.verbose_oidc_logging.unwrap_or(false),
            max_age: spec.max_age.unwrap_or(0),
            token_ttl: spec.token_ttl.unwrap_or(0),
            token_max_ttl: spec.token_max_ttl.unwrap_or(0),
            token_policies: spec.token_policies.clone().unwrap_or_default(),
            token_bound_cidrs: spec.token_bound_cidrs.clone().unwrap_or_default(),
            token_explicit_max_ttl: spec.token_explicit_max_ttl.unwrap_or(0),
            token_no_default_policy: spec.token_no_default_policy.unwrap_or(false),
            token_num_uses: spec.token_num_uses.unwrap_or(0),
            token_period: spec.token_period.unwrap_or(0),
            token_type: spec.token_type.clone(),
        }
    }

    /// Decode a record read back from Vault. Unknown keys are ignored;
    /// missing or null keys decode to zero values; a value of the wrong
    /// kind aborts the decode.
    pub fn from_wire(path: &str, data: &VaultData) -> Result<Self, Error> {
        Ok(Self {
            role_name: wire::string_field(path, data, ROLE_NAME)?,
            namespace: wire::string_field(path, data, NAMESPACE)?,
            role_type: wire::string_field(path, data, ROLE_TYPE)?,
            bound_audiences: wire::string_list_field(path, data, BOUND_AUDIENCES)?,
            user_claim: wire::string_field(path, data, USER_CLAIM)?,
            user_claim_json_pointer: wire::bool_field(path, data, USER_CLAIM_JSON_POINTER)?,
            bound_subject: wire::string_field(path, data, BOUND_SUBJECT)?,
            bound_claims: wire::string_map_field(path, data, BOUND_CLAIMS)?,
            bound_claims_type: wire::string_field(path, data, BOUND_CLAIMS_TYPE)?,
            claim_mappings: wire::string_map_field(path, data, CLAIM_MAPPINGS)?,
            oidc_scopes: wire::string_list_field(path, data, OIDC_SCOPES)?,
            groups_claim: wire::string_field(path, data, GROUPS_CLAIM)?,
            allowed_redirect_uris: wire::string_list_field(path, data, ALLOWED_REDIRECT_URIS)?,
            clock_skew_leeway: wire::int_field(path, data, CLOCK_SKEW_LEEWAY)?,
            expiration_leeway: wire::int_field(path, data, EXPIRATION_LEEWAY)?,
            not_before_leeway: wire::int_field(path, data, NOT_BEFORE_LEEWAY)?,
            verbose_oidc_logging: wire::bool_field(path, data, VERBOSE_OIDC_LOGGING)?,
            max_age: wire::int_field(path, data, MAX_AGE)?,
            token_ttl: wire::int_field(path, data, TOKEN_TTL)?,
            token_max_ttl: wire::int_field(path, data, TOKEN_MAX_TTL)?,
            token_policies: wire::string_list_field(path, data, TOKEN_POLICIES)?,
            token_bound_cidrs: wire::string_list_field(path, data, TOKEN_BOUND_CIDRS)?,
            token_explicit_max_ttl: wire::int_field(path, data, TOKEN_EXPLICIT_MAX_TTL)?,
            token_no_default_policy: wire::bool_field(path, data, TOKEN_NO_DEFAULT_POLICY)?,
            token_num_uses: wire::int_field(path, data, TOKEN_NUM_USES)?,
            token_period: wire::int_field(path, data, TOKEN_PERIOD)?,
            token_type: wire::string_field(path, data, TOKEN_TYPE)?,
        })
    }

    /// Render the full write payload. Every key is always present; Vault
    /// treats a write as a full replacement of the role.
    pub fn to_wire(&self) -> VaultData {
        let mut data = VaultData::new();
        wire::put_string(&mut data, ROLE_NAME, &self.role_name);
        wire::put_string(&mut data, NAMESPACE, &self.namespace);
        wire::put_string(&mut data, ROLE_TYPE, &self.role_type);
        wire::put_string_list(&mut data, BOUND_AUDIENCES, &self.bound_audiences);
        wire::put_string(&mut data, USER_CLAIM, &self.user_claim);
        wire::put_bool(&mut data, USER_CLAIM_JSON_POINTER, self.user_claim_json_pointer);
        wire::put_string(&mut data, BOUND_SUBJECT, &self.bound_subject);
        wire::put_string_map(&mut data, BOUND_CLAIMS, &self.bound_claims);
        wire::put_string(&mut data, BOUND_CLAIMS_TYPE, &self.bound_claims_type);
        wire::put_string_map(&mut data, CLAIM_MAPPINGS, &self.claim_mappings);
        wire::put_string_list(&mut data, OIDC_SCOPES, &self.oidc_scopes);
        wire::put_string(&mut data, GROUPS_CLAIM, &self.groups_claim);
        wire::put_string_list(&mut data, ALLOWED_REDIRECT_URIS, &self.allowed_redirect_uris);
        wire::put_int(&mut data, CLOCK_SKEW_LEEWAY, self.clock_skew_leeway);
        wire::put_int(&mut data, EXPIRATION_LEEWAY, self.expiration_leeway);
        wire::put_int(&mut data, NOT_BEFORE_LEEWAY, self.not_before_leeway);
        wire::put_bool(&mut data, VERBOSE_OIDC_LOGGING, self.verbose_oidc_logging);
        wire::put_int(&mut data, MAX_AGE, self.max_age);
        wire::put_int(&mut data, TOKEN_TTL, self.token_ttl);
        wire::put_int(&mut data, TOKEN_MAX_TTL, self.token_max_ttl);
        wire::put_string_list(&mut data, TOKEN_POLICIES, &self.token_policies);
        wire::put_string_list(&mut data, TOKEN_BOUND_CIDRS, &self.token_bound_cidrs);
        wire::put_int(&mut data, TOKEN_EXPLICIT_MAX_TTL, self.token_explicit_max_ttl);
        wire::put_bool(&mut data, TOKEN_NO_DEFAULT_POLICY, self.token_no_default_policy);
        wire::put_int(&mut data, TOKEN_NUM_USES, self.token_num_uses);
        wire::put_int(&mut data, TOKEN_PERIOD, self.token_period);
        wire::put_string(&mut data, TOKEN_TYPE, &self.token_type);
        data
    }

    /// Cross-field constraints Vault enforces server-side, checked here
    /// before any write. The leeway knobs only exist for `jwt` roles; an
    /// `oidc` role carrying one is a spec mistake, not a zero to be sent.
    pub fn validate(&self) -> Result<(), Error> {
        if !ROLE_TYPES.contains(&self.role_type.as_str()) {
            return Err(Error::validation(
                KIND,
                &self.role_name,
                format!("role_type must be one of jwt, oidc; got {:?}", self.role_type),
            ));
        }
        if !BOUND_CLAIMS_TYPES.contains(&self.bound_claims_type.as_str()) {
            return Err(Error::validation(
                KIND,
                &self.role_name,
                format!(
                    "bound_claims_type must be one of string, glob; got {:?}",
                    self.bound_claims_type
                ),
            ));
        }
        if !TOKEN_TYPES.contains(&self.token_type.as_str()) {
            return Err(Error::validation(
                KIND,
                &self.role_name,
                format!(
                    "token_type must be one of service, batch, default; got {:?}",
                    self.token_type
                ),
            ));
        }
        if self.role_type != ROLE_TYPE_JWT {
            for (key, value) in [
                (CLOCK_SKEW_LEEWAY, self.clock_skew_leeway),
                (EXPIRATION_LEEWAY, self.expiration_leeway),
                (NOT_BEFORE_LEEWAY, self.not_before_leeway),
            ] {
                if value != 0 {
                    return Err(Error::validation(
                        KIND,
                        &self.role_name,
                        format!("{key} is only applicable for jwt roles"),
                    ));
                }
            }
        }
        Ok(())
    }
}

type FieldEq = fn(&JwtRoleRecord, &JwtRoleRecord) -> bool;

/// Comparison table: every configured field of the role, with `role_name`
/// and `namespace` deliberately absent.
const COMPARED_FIELDS: &[(&str, FieldEq)] = &[
    (ROLE_TYPE, |d, a| d.role_type == a.role_type),
    (BOUND_AUDIENCES, |d, a| d.bound_audiences == a.bound_audiences),
    (USER_CLAIM, |d, a| d.user_claim == a.user_claim),
    (USER_CLAIM_JSON_POINTER, |d, a| {
        d.user_claim_json_pointer == a.user_claim_json_pointer
    }),
    (BOUND_SUBJECT, |d, a| d.bound_subject == a.bound_subject),
    (BOUND_CLAIMS, |d, a| d.bound_claims == a.bound_claims),
    (BOUND_CLAIMS_TYPE, |d, a| d.bound_claims_type == a.bound_claims_type),
    (CLAIM_MAPPINGS, |d, a| d.claim_mappings == a.claim_mappings),
    (OIDC_SCOPES, |d, a| d.oidc_scopes == a.oidc_scopes),
    (GROUPS_CLAIM, |d, a| d.groups_claim == a.groups_claim),
    (ALLOWED_REDIRECT_URIS, |d, a| {
        d.allowed_redirect_uris == a.allowed_redirect_uris
    }),
    (CLOCK_SKEW_LEEWAY, |d, a| d.clock_skew_leeway == a.clock_skew_leeway),
    (EXPIRATION_LEEWAY, |d, a| d.expiration_leeway == a.expiration_leeway),
    (NOT_BEFORE_LEEWAY, |d, a| d.not_before_leeway == a.not_before_leeway),
    (VERBOSE_OIDC_LOGGING, |d, a| {
        d.verbose_oidc_logging == a.verbose_oidc_logging
    }),
    (MAX_AGE, |d, a| d.max_age == a.max_age),
    (TOKEN_TTL, |d, a| d.token_ttl == a.token_ttl),
    (TOKEN_MAX_TTL, |d, a| d.token_max_ttl == a.token_max_ttl),
    (TOKEN_POLICIES, |d, a| d.token_policies == a.token_policies),
    (TOKEN_BOUND_CIDRS, |d, a| d.token_bound_cidrs == a.token_bound_cidrs),
    (TOKEN_EXPLICIT_MAX_TTL, |d, a| {
        d.token_explicit_max_ttl == a.token_explicit_max_ttl
    }),
    (TOKEN_NO_DEFAULT_POLICY, |d, a| {
        d.token_no_default_policy == a.token_no_default_policy
    }),
    (TOKEN_NUM_USES, |d, a| d.token_num_uses == a.token_num_uses),
    (TOKEN_PERIOD, |d, a| d.token_period == a.token_period),
    (TOKEN_TYPE, |d, a| d.token_type == a.token_type),
];

/// Name of the first field where the remote role deviates from the desired
/// record, for debug logging. `None` means the role is up to date.
pub fn first_difference(desired: &JwtRoleRecord, actual: &JwtRoleRecord) -> Option<&'static str> {
    COMPARED_FIELDS
        .iter()
        .find(|(_, field_eq)| !field_eq(desired, actual))
        .map(|(name, _)| *name)
}

pub fn up_to_date(desired: &JwtRoleRecord, actual: &JwtRoleRecord) -> bool {
    first_difference(desired, actual).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn spec_from(value: Value) -> JwtRoleSpec {
        serde_json::from_value(value).expect("valid spec json")
    }

    fn wire_map(value: Value) -> VaultData {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn rich_spec() -> JwtRoleSpec {
        spec_from(json!({
            "backend": "gitlab",
            "roleType": "jwt",
            "boundAudiences": ["https://git.example.com"],
            "userClaim": "sub",
            "userClaimJsonPointer": true,
            "boundSubject": "project_123",
            "boundClaims": {"project_path": "group/app"},
            "boundClaimsType": "glob",
            "claimMappings": {"user_email": "email"},
            "oidcScopes": ["openid"],
            "groupsClaim": "groups",
            "allowedRedirectUris": ["https://vault.example.com/ui/vault/auth/jwt/oidc/callback"],
            "clockSkewLeeway": 30,
            "expirationLeeway": 60,
            "notBeforeLeeway": 90,
            "verboseOidcLogging": true,
            "maxAge": 86400,
            "tokenTtl": 3600,
            "tokenMaxTtl": 7200,
            "tokenPolicies": ["ci", "read-secrets"],
            "tokenBoundCidrs": ["10.0.0.0/8"],
            "tokenExplicitMaxTtl": 14400,
            "tokenNoDefaultPolicy": true,
            "tokenNumUses": 5,
            "tokenPeriod": 600,
            "tokenType": "service"
        }))
    }

    #[test]
    fn default_record_emits_every_key_with_zero_values() {
        let record = JwtRoleRecord::from_params("test-role", &spec_from(json!({})));
        let expected = wire_map(json!({
            "role_name": "test-role",
            "namespace": "",
            "role_type": "oidc",
            "bound_audiences": [],
            "user_claim": "",
            "user_claim_json_pointer": false,
            "bound_subject": "",
            "bound_claims": {},
            "bound_claims_type": "string",
            "claim_mappings": {},
            "oidc_scopes": [],
            "groups_claim": "",
            "allowed_redirect_uris": [],
            "clock_skew_leeway": 0,
            "expiration_leeway": 0,
            "not_before_leeway": 0,
            "verbose_oidc_logging": false,
            "max_age": 0,
            "token_ttl": 0,
            "token_max_ttl": 0,
            "token_policies": [],
            "token_bound_cidrs": [],
            "token_explicit_max_ttl": 0,
            "token_no_default_policy": false,
            "token_num_uses": 0,
            "token_period": 0,
            "token_type": "default"
        }));
        assert_eq!(record.to_wire(), expected);
    }

    #[test]
    fn round_trip_restores_every_set_field() {
        let desired = JwtRoleRecord::from_params("ci-role", &rich_spec());
        let decoded =
            JwtRoleRecord::from_wire("auth/gitlab/role/ci-role", &desired.to_wire()).unwrap();
        assert_eq!(decoded, desired);
    }

    #[test]
    fn from_wire_defaults_missing_keys_to_zero_values() {
        let record = JwtRoleRecord::from_wire("auth/jwt/role/empty", &VaultData::new()).unwrap();
        assert_eq!(record.role_type, "");
        assert_eq!(record.token_ttl, 0);
        assert!(record.bound_audiences.is_empty());
        assert!(record.bound_claims.is_empty());
        assert!(!record.verbose_oidc_logging);
    }

    #[test]
    fn from_wire_treats_null_collections_as_empty() {
        let data = wire_map(json!({
            "bound_audiences": null,
            "bound_claims": null,
            "token_policies": null
        }));
        let record = JwtRoleRecord::from_wire("auth/jwt/role/x", &data).unwrap();
        assert!(record.bound_audiences.is_empty());
        assert!(record.bound_claims.is_empty());
        assert!(record.token_policies.is_empty());
    }

    #[test]
    fn from_wire_ignores_unknown_keys() {
        let data = wire_map(json!({
            "role_type": "jwt",
            "some_future_vault_key": {"nested": true}
        }));
        let record = JwtRoleRecord::from_wire("auth/jwt/role/x", &data).unwrap();
        assert_eq!(record.role_type, "jwt");
    }

    #[test]
    fn from_wire_coerces_float_and_string_numbers() {
        let data = wire_map(json!({
            "token_ttl": 3600.0,
            "clock_skew_leeway": "30"
        }));
        let record = JwtRoleRecord::from_wire("auth/jwt/role/x", &data).unwrap();
        assert_eq!(record.token_ttl, 3600);
        assert_eq!(record.clock_skew_leeway, 30);
    }

    #[test]
    fn from_wire_rejects_wrongly_typed_values() {
        let data = wire_map(json!({"bound_audiences": "not-a-list"}));
        let err = JwtRoleRecord::from_wire("auth/jwt/role/x", &data).unwrap_err();
        match err {
            Error::Decode { field, .. } => assert_eq!(field, "bound_audiences"),
            other => panic!("expected decode error, got {other}"),
        }
    }

    #[test]
    fn records_differing_only_in_name_and_namespace_are_up_to_date() {
        let desired = JwtRoleRecord::from_params("ci-role", &rich_spec());
        let mut actual = desired.clone();
        actual.role_name = "something-else".to_string();
        actual.namespace = "tenant-a".to_string();
        assert!(up_to_date(&desired, &actual));
        assert_eq!(first_difference(&desired, &actual), None);
    }

    #[test]
    fn role_type_drift_is_detected() {
        let desired = JwtRoleRecord::from_params(
            "test-role",
            &spec_from(json!({"backend": "gitlab", "roleType": "jwt", "userClaim": "sub"})),
        );
        let actual =
            JwtRoleRecord::from_wire("auth/gitlab/role/test-role", &wire_map(json!({"role_type": "oidc"})))
                .unwrap();
        assert!(!up_to_date(&desired, &actual));
        assert_eq!(first_difference(&desired, &actual), Some("role_type"));
    }

    #[test]
    fn collection_drift_is_detected() {
        let desired = JwtRoleRecord::from_params("ci-role", &rich_spec());

        let mut claims_changed = desired.clone();
        claims_changed
            .bound_claims
            .insert("project_path".to_string(), "group/other".to_string());
        assert_eq!(first_difference(&desired, &claims_changed), Some("bound_claims"));

        let mut policies_reordered = desired.clone();
        policies_reordered.token_policies.reverse();
        assert_eq!(
            first_difference(&desired, &policies_reordered),
            Some("token_policies")
        );
    }

    #[test]
    fn numeric_drift_is_detected() {
        let desired = JwtRoleRecord::from_params("ci-role", &rich_spec());
        let mut ttl_changed = desired.clone();
        ttl_changed.token_ttl += 1;
        assert_eq!(first_difference(&desired, &ttl_changed), Some("token_ttl"));
    }

    #[test]
    fn leeways_are_accepted_for_jwt_roles() {
        let record = JwtRoleRecord::from_params("ci-role", &rich_spec());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn leeways_are_rejected_for_oidc_roles() {
        let record = JwtRoleRecord::from_params(
            "sso-role",
            &spec_from(json!({"roleType": "oidc", "clockSkewLeeway": 30})),
        );
        let err = record.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("clock_skew_leeway is only applicable for jwt roles"));
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let bad_role_type =
            JwtRoleRecord::from_params("r", &spec_from(json!({"roleType": "saml"})));
        assert!(bad_role_type.validate().is_err());

        let bad_claims_type =
            JwtRoleRecord::from_params("r", &spec_from(json!({"boundClaimsType": "regex"})));
        assert!(bad_claims_type.validate().is_err());

        let bad_token_type =
            JwtRoleRecord::from_params("r", &spec_from(json!({"tokenType": "forever"})));
        assert!(bad_token_type.validate().is_err());
    }
}
