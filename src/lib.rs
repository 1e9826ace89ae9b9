//! Vault Resource Controller Library
//!
//! A Kubernetes controller that reconciles declarative resources against a
//! HashiCorp Vault server: JWT/OIDC auth roles, AWS secret engine roles,
//! generic key/value secrets and ACL policies. Each kind is declared as a
//! Custom Resource and continuously synced to Vault; drift is detected by
//! reading the remote object back and comparing it field by field.
//!
//! Tests are included in the module files (e.g., the `vault` wire records
//! and the per-kind reconcilers).

// Re-export modules so they can be tested
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod server;
pub mod vault;

pub use error::{Error, Result};
