//! # Custom Resource Definitions
//!
//! CRD types for the Vault Resource Controller.
//!
//! Each resource kind declares one Vault object and carries the shared
//! [`ResourceStatus`] so `kubectl` reports readiness the same way across
//! kinds.
//!
//! ## Module Structure
//!
//! - `jwt_role.rs` - roles on JWT/OIDC auth backends
//! - `aws_role.rs` - roles on AWS secret engines
//! - `generic_secret.rs` - key/value secrets at arbitrary paths
//! - `policy.rs` - ACL policies
//! - `status.rs` - shared status and condition types

mod aws_role;
mod generic_secret;
mod jwt_role;
mod policy;
mod status;

// Re-export all public types
pub use aws_role::{AwsRole, AwsRoleSpec};
pub use generic_secret::{GenericSecret, GenericSecretSpec};
pub use jwt_role::{JwtRole, JwtRoleSpec};
pub use policy::{VaultPolicy, VaultPolicySpec};
pub use status::{
    Condition, ResourceStatus, CONDITION_READY, REASON_AVAILABLE, REASON_CREATING,
    REASON_RECONCILE_ERROR, REASON_UPDATING,
};
