//! Common test utilities for Pact contract tests
//!
//! Provides shared initialization for tests that talk to a mock Vault
//! server over HTTP, including rustls crypto provider setup.

use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Initialize the rustls crypto provider for tests
///
/// Required for rustls 0.23+ when no default provider is selected through
/// features. Uses a `Once` so repeated calls across tests are harmless;
/// ring matches the provider the controller binary uses.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}
