//! # CRD Validation Tests
//!
//! Comprehensive tests for all CRD elements to catch schema drift early.
//! These tests validate that manifests deserialize correctly, that spec
//! defaults are applied, and that the generated CRDs carry the expected
//! names, versions, and printer columns.

use kube::core::CustomResourceExt;

use vault_resource_controller::crd::{
    AwsRole, GenericSecret, JwtRole, ResourceStatus, VaultPolicy, CONDITION_READY,
    REASON_AVAILABLE,
};

/// Test JwtRole with all fields populated
#[test]
fn test_jwt_role_full_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: JwtRole
metadata:
  name: gitlab-ci
  namespace: default
spec:
  backend: gitlab
  roleType: jwt
  boundAudiences:
    - https://gitlab.example.com
  userClaim: user_email
  boundSubject: project_path:group/app:ref_type:branch:ref:main
  boundClaims:
    project_id: "42"
  boundClaimsType: glob
  claimMappings:
    user_email: email
  groupsClaim: groups
  clockSkewLeeway: 60
  expirationLeeway: 120
  notBeforeLeeway: 90
  tokenTtl: 3600
  tokenMaxTtl: 7200
  tokenPolicies:
    - ci-read
  tokenBoundCidrs:
    - 10.0.0.0/8
  tokenExplicitMaxTtl: 14400
  tokenNoDefaultPolicy: true
  tokenNumUses: 10
  tokenPeriod: 0
  tokenType: service
"#;

    let role: JwtRole = serde_yaml::from_str(yaml).expect("Should deserialize full JwtRole");

    assert_eq!(role.spec.backend, "gitlab");
    assert_eq!(role.spec.role_type, "jwt");
    assert_eq!(
        role.spec.bound_audiences,
        Some(vec!["https://gitlab.example.com".to_string()])
    );
    assert_eq!(role.spec.user_claim.as_deref(), Some("user_email"));
    assert_eq!(role.spec.bound_claims_type, "glob");
    assert_eq!(
        role.spec.bound_claims.as_ref().and_then(|c| c.get("project_id")),
        Some(&"42".to_string())
    );
    assert_eq!(role.spec.clock_skew_leeway, Some(60));
    assert_eq!(role.spec.token_ttl, Some(3600));
    assert_eq!(role.spec.token_policies, Some(vec!["ci-read".to_string()]));
    assert_eq!(role.spec.token_no_default_policy, Some(true));
    assert_eq!(role.spec.token_type, "service");
}

/// Test JwtRole minimal manifest (defaults applied)
#[test]
fn test_jwt_role_minimal_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: JwtRole
metadata:
  name: minimal
  namespace: default
spec: {}
"#;

    let role: JwtRole = serde_yaml::from_str(yaml).expect("Should deserialize minimal JwtRole");

    assert_eq!(role.spec.backend, "jwt");
    assert_eq!(role.spec.role_type, "oidc");
    assert_eq!(role.spec.bound_claims_type, "string");
    assert_eq!(role.spec.token_type, "default");
    assert!(role.spec.bound_audiences.is_none());
    assert!(role.spec.user_claim.is_none());
    assert!(role.spec.token_ttl.is_none());
    assert!(role.status.is_none());
}

/// Test AwsRole for assumed_role credentials
#[test]
fn test_aws_role_assumed_role_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: AwsRole
metadata:
  name: deployer
  namespace: default
spec:
  backend: aws-master
  credentialType: assumed_role
  roleArns:
    - arn:aws:iam::123456789012:role/deployer
  defaultStsTtl: 900
  maxStsTtl: 3600
"#;

    let role: AwsRole = serde_yaml::from_str(yaml).expect("Should deserialize AwsRole");

    assert_eq!(role.spec.backend, "aws-master");
    assert_eq!(role.spec.credential_type, "assumed_role");
    assert_eq!(
        role.spec.role_arns,
        Some(vec!["arn:aws:iam::123456789012:role/deployer".to_string()])
    );
    assert_eq!(role.spec.default_sts_ttl, Some(900));
    assert_eq!(role.spec.max_sts_ttl, Some(3600));
    assert!(role.spec.user_path.is_none());
}

/// Test AwsRole backend default and required credentialType
#[test]
fn test_aws_role_minimal_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: AwsRole
metadata:
  name: app-user
  namespace: default
spec:
  credentialType: iam_user
  policyArns:
    - arn:aws:iam::aws:policy/ReadOnlyAccess
"#;

    let role: AwsRole = serde_yaml::from_str(yaml).expect("Should deserialize minimal AwsRole");

    assert_eq!(role.spec.backend, "aws");
    assert_eq!(role.spec.credential_type, "iam_user");

    // credentialType is required
    let missing = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: AwsRole
metadata:
  name: broken
  namespace: default
spec:
  backend: aws
"#;
    assert!(serde_yaml::from_str::<AwsRole>(missing).is_err());
}

/// Test GenericSecret manifest with and without an explicit path
#[test]
fn test_generic_secret_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: GenericSecret
metadata:
  name: db-creds
  namespace: default
spec:
  backend: kv
  path: teams/platform/db-creds
  dataJson: '{"username": "app", "password": "hunter2"}'
"#;

    let secret: GenericSecret =
        serde_yaml::from_str(yaml).expect("Should deserialize GenericSecret");

    assert_eq!(secret.spec.backend, "kv");
    assert_eq!(secret.spec.path.as_deref(), Some("teams/platform/db-creds"));
    assert!(secret.spec.data_json.contains("hunter2"));

    let minimal = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: GenericSecret
metadata:
  name: db-creds
  namespace: default
spec:
  dataJson: '{"token": "abc"}'
"#;

    let secret: GenericSecret =
        serde_yaml::from_str(minimal).expect("Should deserialize minimal GenericSecret");

    // The backend defaults and the path falls back to the resource name
    assert_eq!(secret.spec.backend, "secret");
    assert!(secret.spec.path.is_none());
}

/// Test VaultPolicy manifest
#[test]
fn test_vault_policy_manifest() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: VaultPolicy
metadata:
  name: app-read
  namespace: default
spec:
  rules: |
    path "secret/data/app/*" {
      capabilities = ["read"]
    }
"#;

    let policy: VaultPolicy = serde_yaml::from_str(yaml).expect("Should deserialize VaultPolicy");

    assert!(policy.spec.rules.contains("secret/data/app/*"));
    assert!(policy.spec.rules.contains("\"read\""));

    // rules is required
    let missing = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: VaultPolicy
metadata:
  name: broken
  namespace: default
spec: {}
"#;
    assert!(serde_yaml::from_str::<VaultPolicy>(missing).is_err());
}

/// Test that spec fields serialize as camelCase
#[test]
fn test_spec_serializes_camel_case() {
    let yaml = r#"
apiVersion: vault.microscaler.io/v1alpha1
kind: JwtRole
metadata:
  name: gitlab-ci
  namespace: default
spec:
  boundAudiences:
    - aud
  tokenTtl: 60
"#;

    let role: JwtRole = serde_yaml::from_str(yaml).expect("Should deserialize JwtRole");
    let json = serde_json::to_value(&role.spec).expect("Should serialize spec");

    assert!(json.get("boundAudiences").is_some());
    assert!(json.get("tokenTtl").is_some());
    assert!(json.get("roleType").is_some());
    assert!(json.get("bound_audiences").is_none());
}

/// Test generated CRD names, group, and version for all four kinds
#[test]
fn test_generated_crd_metadata() {
    let cases = [
        (JwtRole::crd(), "JwtRole", "jwtroles"),
        (AwsRole::crd(), "AwsRole", "awsroles"),
        (GenericSecret::crd(), "GenericSecret", "genericsecrets"),
        (VaultPolicy::crd(), "VaultPolicy", "vaultpolicies"),
    ];

    for (crd, kind, plural) in cases {
        assert_eq!(crd.spec.group, "vault.microscaler.io");
        assert_eq!(crd.spec.names.kind, kind);
        assert_eq!(crd.spec.names.plural, plural);
        assert_eq!(crd.spec.scope, "Namespaced");

        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1alpha1");

        // Status subresource must exist for patch_status to work
        let subresources = version
            .subresources
            .as_ref()
            .unwrap_or_else(|| panic!("{kind} is missing subresources"));
        assert!(subresources.status.is_some(), "{kind} is missing the status subresource");

        // Ready and Path printer columns
        let columns = version
            .additional_printer_columns
            .as_ref()
            .unwrap_or_else(|| panic!("{kind} is missing printer columns"));
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Ready"), "{kind} is missing the Ready column");
        assert!(names.contains(&"Path"), "{kind} is missing the Path column");
    }
}

/// Test that the status block serializes as camelCase
#[test]
fn test_status_serializes_camel_case() {
    let status = ResourceStatus::new(
        true,
        REASON_AVAILABLE,
        "role at auth/jwt/role/gitlab matches its spec",
        Some(3),
        "auth/jwt/role/gitlab",
    );

    let json = serde_json::to_value(&status).expect("Should serialize status");

    assert_eq!(json["observedGeneration"], 3);
    assert_eq!(json["vaultPath"], "auth/jwt/role/gitlab");
    assert!(json.get("lastReconcileTime").is_some());

    let condition = &json["conditions"][0];
    assert_eq!(condition["type"], CONDITION_READY);
    assert_eq!(condition["status"], "True");
    assert_eq!(condition["reason"], REASON_AVAILABLE);
    assert!(condition.get("lastTransitionTime").is_some());
}
