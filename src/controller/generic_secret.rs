//! # GenericSecret Reconciler
//!
//! Reconciles [`GenericSecret`] objects against `{backend}/{path}` on the
//! Vault server. The secret payload is the spec's JSON document verbatim,
//! and a finalizer removes the secret from Vault when the Kubernetes
//! object is deleted.

use std::sync::Arc;
use std::time::Instant;

use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event};
use tracing::{debug, info};

use super::{Context, Observation, OP_DELETE, OP_READ, OP_WRITE};
use crate::crd::{
    GenericSecret, GenericSecretSpec, ResourceStatus, REASON_AVAILABLE, REASON_CREATING,
    REASON_UPDATING,
};
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::vault::generic_secret::{self, SecretRecord};
use crate::vault::LogicalOps;

pub const FINALIZER: &str = "vault.microscaler.io/generic-secret-cleanup";

const KIND: &str = "GenericSecret";

const ERR_READ: &str = "cannot read secret";
const ERR_CREATE: &str = "cannot create secret";
const ERR_UPDATE: &str = "cannot update secret";
const ERR_DELETE: &str = "cannot delete secret";

/// Vault API path of the secret declared by this spec. The optional
/// `path` field overrides the resource name and may contain slashes.
pub fn secret_path(spec: &GenericSecretSpec, name: &str) -> String {
    let relative = spec.path.as_deref().unwrap_or(name);
    format!(
        "{}/{}",
        super::trim_path(&spec.backend),
        super::trim_path(relative)
    )
}

pub async fn reconcile(secret: Arc<GenericSecret>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = secret
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(secret.name_any()))?;
    let api: Api<GenericSecret> = Api::namespaced(ctx.client.clone(), &namespace);

    finalizer(&api, FINALIZER, secret, |event| async {
        match event {
            Event::Apply(secret) => apply(&secret, &ctx).await,
            Event::Cleanup(secret) => cleanup(&secret, &ctx).await,
        }
    })
    .await
    .map_err(Error::finalizer)
}

pub fn error_policy(secret: Arc<GenericSecret>, error: &Error, ctx: Arc<Context>) -> Action {
    let path = secret_path(&secret.spec, &secret.name_any());
    super::handle_error(&secret, secret.status.clone(), error, &ctx, path)
}

async fn apply(secret: &GenericSecret, ctx: &Context) -> Result<Action> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let name = secret.name_any();
    let path = secret_path(&secret.spec, &name);
    let desired = SecretRecord::from_params(&name, &secret.spec)?;

    let observation = observe(ctx.logical.as_ref(), &path, &desired).await?;
    let (ready, reason, message) = if !observation.exists {
        create(ctx.logical.as_ref(), &path, &desired).await?;
        info!("Created secret {name} at {path}");
        (false, REASON_CREATING, format!("secret written to {path}"))
    } else if !observation.up_to_date {
        update(ctx.logical.as_ref(), &path, &desired).await?;
        info!("Updated secret {name} at {path}");
        (false, REASON_UPDATING, format!("secret rewritten at {path}"))
    } else {
        (true, REASON_AVAILABLE, format!("secret at {path} matches its spec"))
    };

    let status = ResourceStatus::new(ready, reason, &message, secret.metadata.generation, &path);
    super::publish_status(ctx.client.clone(), secret, secret.status.as_ref(), &status).await?;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    Ok(Action::requeue(ctx.requeue_interval))
}

async fn cleanup(secret: &GenericSecret, ctx: &Context) -> Result<Action> {
    let name = secret.name_any();
    let path = secret_path(&secret.spec, &name);
    delete(ctx.logical.as_ref(), &path).await?;
    info!("Deleted secret {name} at {path}");
    Ok(Action::await_change())
}

/// Read the remote secret and compare it to the desired document. Only a
/// missing secret reports as absent; any other read failure propagates.
pub async fn observe(
    logical: &dyn LogicalOps,
    path: &str,
    desired: &SecretRecord,
) -> Result<Observation> {
    let Some(data) = super::timed_vault_op(KIND, OP_READ, ERR_READ, logical.read(path)).await?
    else {
        return Ok(Observation::ABSENT);
    };
    let actual = SecretRecord::from_wire(&data);
    let up_to_date = generic_secret::up_to_date(desired, &actual);
    if !up_to_date {
        if let Some(key) = generic_secret::first_difference(desired, &actual) {
            debug!("Secret at {path} differs from spec in key {key}");
        }
    }
    Ok(Observation {
        exists: true,
        up_to_date,
    })
}

pub async fn create(logical: &dyn LogicalOps, path: &str, desired: &SecretRecord) -> Result<()> {
    super::timed_vault_op(KIND, OP_WRITE, ERR_CREATE, logical.write(path, desired.to_wire())).await
}

pub async fn update(logical: &dyn LogicalOps, path: &str, desired: &SecretRecord) -> Result<()> {
    super::timed_vault_op(KIND, OP_WRITE, ERR_UPDATE, logical.write(path, desired.to_wire())).await
}

pub async fn delete(logical: &dyn LogicalOps, path: &str) -> Result<()> {
    super::timed_vault_op(KIND, OP_DELETE, ERR_DELETE, logical.delete(path)).await
}
