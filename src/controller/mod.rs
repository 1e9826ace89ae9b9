//! # Reconcilers
//!
//! One controller per resource kind, all built on the same skeleton: a
//! finalizer guards Vault cleanup, an observe step reads the remote object
//! through the [`crate::vault`] traits, and a write happens only when the
//! object is absent or has drifted from its spec. Successful reconciles
//! requeue at the regular interval; retryable failures come back sooner.
//!
//! - `jwt_role`: roles on JWT/OIDC auth backends
//! - `aws_role`: roles on AWS secret engines
//! - `generic_secret`: key/value secrets at arbitrary paths
//! - `policy`: ACL policies under `sys/policies/acl`

pub mod aws_role;
pub mod generic_secret;
pub mod jwt_role;
pub mod policy;

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Controller};
use kube_runtime::watcher;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{error, warn};

use crate::crd::{AwsRole, GenericSecret, JwtRole, ResourceStatus, VaultPolicy, REASON_RECONCILE_ERROR};
use crate::error::Error;
use crate::observability::metrics;
use crate::vault::{LogicalOps, SysOps, VaultError};

/// Field manager recorded on status patches.
pub const CONTROLLER_NAME: &str = "vault-resource-controller";

/// Vault operation labels used in metrics.
pub(crate) const OP_READ: &str = "read";
pub(crate) const OP_WRITE: &str = "write";
pub(crate) const OP_DELETE: &str = "delete";

/// Shared state handed to every reconciler.
pub struct Context {
    /// Kubernetes client, used for status patches.
    pub client: Client,
    /// Generic Vault read/write/delete surface.
    pub logical: Arc<dyn LogicalOps>,
    /// Vault sys surface for ACL policies.
    pub sys: Arc<dyn SysOps>,
    /// Delay between successful reconciles.
    pub requeue_interval: Duration,
    /// Delay before retrying a failed reconcile.
    pub error_requeue_interval: Duration,
}

/// What a read of the remote Vault object told us about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub exists: bool,
    pub up_to_date: bool,
}

impl Observation {
    pub const ABSENT: Self = Self {
        exists: false,
        up_to_date: false,
    };
}

/// Strip leading and trailing slashes so user-supplied mount paths join
/// into Vault API paths without doubled separators.
pub(crate) fn trim_path(segment: &str) -> &str {
    segment.trim_matches('/')
}

/// Run one Vault call with operation metrics and error context attached.
pub(crate) async fn timed_vault_op<T, F>(
    kind: &str,
    operation: &str,
    context: &'static str,
    call: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<T, VaultError>>,
{
    let start = Instant::now();
    match call.await {
        Ok(value) => {
            metrics::record_vault_operation(kind, operation, start.elapsed().as_secs_f64());
            Ok(value)
        }
        Err(e) => {
            metrics::increment_vault_operation_errors(kind, operation);
            Err(Error::vault(context, e))
        }
    }
}

/// Patch the status subresource of any managed kind.
pub(crate) async fn patch_status<K>(
    client: Client,
    obj: &K,
    status: &ResourceStatus,
) -> Result<(), Error>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let namespace = obj
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(obj.name_any()))?;
    let api: Api<K> = Api::namespaced(client, &namespace);
    let patch = json!({ "status": status });
    api.patch_status(
        &obj.name_any(),
        &PatchParams::apply(CONTROLLER_NAME),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}

/// Patch the status subresource unless the current status already reports
/// the same outcome.
pub(crate) async fn publish_status<K>(
    client: Client,
    obj: &K,
    current: Option<&ResourceStatus>,
    next: &ResourceStatus,
) -> Result<(), Error>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    if current.is_some_and(|current| current.outcome_matches(next)) {
        return Ok(());
    }
    patch_status(client, obj, next).await
}

/// Shared failure handling for every kind: log, count, record the error on
/// the resource's Ready condition, and schedule the retry. Retryable
/// failures come back after the error interval; an invalid spec waits for
/// the regular interval since only an edit can fix it.
pub(crate) fn handle_error<K>(
    obj: &Arc<K>,
    current: Option<ResourceStatus>,
    error: &Error,
    ctx: &Arc<Context>,
    vault_path: String,
) -> Action
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    error!("Reconciliation error for {}: {error}", obj.name_any());
    metrics::increment_reconciliation_errors();

    let status = ResourceStatus::new(
        false,
        REASON_RECONCILE_ERROR,
        &error.to_string(),
        obj.meta().generation,
        &vault_path,
    );
    if !current.is_some_and(|current| current.outcome_matches(&status)) {
        // error_policy is sync, so the patch goes through a task
        let client = ctx.client.clone();
        let obj = Arc::clone(obj);
        tokio::spawn(async move {
            if let Err(e) = patch_status(client, obj.as_ref(), &status).await {
                warn!("Failed to record error status for {}: {e}", obj.name_any());
            }
        });
    }

    if error.is_retryable() {
        Action::requeue(ctx.error_requeue_interval)
    } else {
        Action::requeue(ctx.requeue_interval)
    }
}

/// Start one controller per resource kind and drive them until shutdown.
/// Each controller watches its kind cluster-wide and stops cleanly on
/// SIGTERM.
pub async fn run(ctx: Arc<Context>) {
    let client = ctx.client.clone();

    let jwt_roles = Controller::new(
        Api::<JwtRole>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(jwt_role::reconcile, jwt_role::error_policy, ctx.clone())
    .for_each(|_| std::future::ready(()));

    let aws_roles = Controller::new(
        Api::<AwsRole>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(aws_role::reconcile, aws_role::error_policy, ctx.clone())
    .for_each(|_| std::future::ready(()));

    let secrets = Controller::new(
        Api::<GenericSecret>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(
        generic_secret::reconcile,
        generic_secret::error_policy,
        ctx.clone(),
    )
    .for_each(|_| std::future::ready(()));

    let policies = Controller::new(
        Api::<VaultPolicy>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(policy::reconcile, policy::error_policy, ctx.clone())
    .for_each(|_| std::future::ready(()));

    futures::join!(jwt_roles, aws_roles, secrets, policies);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_path_strips_surrounding_slashes() {
        assert_eq!(trim_path("/jwt/"), "jwt");
        assert_eq!(trim_path("gitlab"), "gitlab");
        assert_eq!(trim_path("oidc/azure"), "oidc/azure");
        assert_eq!(trim_path("/teams/platform/"), "teams/platform");
    }

    #[test]
    fn absent_observation_is_not_up_to_date() {
        assert!(!Observation::ABSENT.exists);
        assert!(!Observation::ABSENT.up_to_date);
    }
}
