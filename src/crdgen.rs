//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from Rust type definitions.
//!
//! This binary uses the `kube` crate's `CustomResourceExt` trait to generate
//! the CRD YAML for all four resource kinds as a multi-document stream.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > crds.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```
//!
//! The generated CRDs include:
//! - OpenAPI schema validation
//! - Required fields
//! - Default values
//! - Status subresource

use kube::core::CustomResourceExt;

use vault_resource_controller::crd::{AwsRole, GenericSecret, JwtRole, VaultPolicy};

fn main() {
    // Print header comments warning that this file should not be edited manually
    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# If there are malformed YAML issues, fix them in the Rust code (src/crd/)");
    println!("# This file will be overwritten on every code update");

    for crd in [
        JwtRole::crd(),
        AwsRole::crd(),
        GenericSecret::crd(),
        VaultPolicy::crd(),
    ] {
        match serde_yaml::to_string(&crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
