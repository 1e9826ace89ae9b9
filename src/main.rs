//! # Vault Resource Controller
//!
//! A Kubernetes controller that reconciles declarative Vault resources against a HashiCorp Vault server.
//!
//! ## Overview
//!
//! This binary runs the controller loops for all four resource kinds:
//!
//! 1. **JwtRole** - Roles under a JWT/OIDC auth backend (`auth/<backend>/role/<name>`)
//! 2. **AwsRole** - Roles under an AWS secret backend (`<backend>/roles/<name>`)
//! 3. **GenericSecret** - Arbitrary key/value payloads at any writable path
//! 4. **VaultPolicy** - ACL policies managed through `sys/policies/acl`
//!
//! Each resource is observed against the live Vault object, created or rewritten when it
//! drifts, and deleted from Vault when the Kubernetes resource is removed.
//!
//! ## Configuration
//!
//! The Vault connection is configured through the environment: `VAULT_ADDR` and
//! `VAULT_TOKEN` are required, `VAULT_NAMESPACE` and `VAULT_TIMEOUT_SECS` are optional.
//! Controller timing and the metrics port are flags with environment fallbacks, see
//! `--help`.
//!
//! ## Observability
//!
//! - **Prometheus metrics**: Exposes reconcile and Vault call metrics on `/metrics`
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use kube::Client;
use tracing::{error, info};

use vault_resource_controller::controller::{self, Context};
use vault_resource_controller::observability::metrics;
use vault_resource_controller::server::{start_server, ServerState};
use vault_resource_controller::vault::{HttpVaultClient, VaultConfig};

/// Runtime flags, each overridable through the environment.
#[derive(Parser, Debug)]
#[command(
    name = "vault-resource-controller",
    version,
    about = "Reconciles Vault roles, secrets and policies declared as Kubernetes resources"
)]
struct Args {
    /// Port for the metrics and health probe HTTP server.
    #[arg(long, env = "METRICS_PORT", default_value_t = 8080)]
    metrics_port: u16,

    /// Seconds between re-checks of a resource that is in sync with Vault.
    #[arg(long, env = "REQUEUE_INTERVAL", default_value_t = 300)]
    requeue_interval: u64,

    /// Seconds before a resource whose reconcile failed is retried.
    #[arg(long, env = "ERROR_REQUEUE_INTERVAL", default_value_t = 60)]
    error_requeue_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure the rustls crypto provider before any TLS connection is
    // opened. Required for rustls 0.23+ when no default provider is set
    // via features; both the Kubernetes and Vault clients use rustls.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_resource_controller=info".into()),
        )
        .init();

    info!("Starting Vault Resource Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    // Initialize metrics
    metrics::register_metrics()?;

    // Start HTTP server for metrics and probes
    let server_state = ServerState::new();
    let server_state_clone = server_state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(args.metrics_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Create Kubernetes client
    let client = Client::try_default().await?;

    // Build the Vault client up front so a bad address or missing token fails
    // startup instead of the first reconcile.
    let vault = Arc::new(HttpVaultClient::new(VaultConfig::from_env()?)?);

    let ctx = Arc::new(Context {
        client,
        logical: vault.clone(),
        sys: vault,
        requeue_interval: Duration::from_secs(args.requeue_interval),
        error_requeue_interval: Duration::from_secs(args.error_requeue_interval),
    });

    // Mark as ready
    server_state.mark_ready();

    controller::run(ctx).await;

    info!("Controller stopped");

    Ok(())
}
