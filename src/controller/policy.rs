//! # VaultPolicy Reconciler
//!
//! Reconciles [`VaultPolicy`] objects against `sys/policies/acl/{name}` on
//! the Vault server. Policies are plain rule strings; the remote policy is
//! up to date exactly when its rules match the spec verbatim. A finalizer
//! removes the policy from Vault when the Kubernetes object is deleted.

use std::sync::Arc;
use std::time::Instant;

use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event};
use tracing::{debug, info};

use super::{Context, Observation, OP_DELETE, OP_READ, OP_WRITE};
use crate::crd::{
    ResourceStatus, VaultPolicy, REASON_AVAILABLE, REASON_CREATING, REASON_UPDATING,
};
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::vault::SysOps;

pub const FINALIZER: &str = "vault.microscaler.io/policy-cleanup";

const KIND: &str = "VaultPolicy";

const ERR_READ: &str = "cannot read policy";
const ERR_CREATE: &str = "cannot create policy";
const ERR_UPDATE: &str = "cannot update policy";
const ERR_DELETE: &str = "cannot delete policy";

/// Vault API path of the policy, as reported in the resource status.
pub fn policy_path(name: &str) -> String {
    format!("sys/policies/acl/{name}")
}

pub async fn reconcile(policy: Arc<VaultPolicy>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = policy
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(policy.name_any()))?;
    let api: Api<VaultPolicy> = Api::namespaced(ctx.client.clone(), &namespace);

    finalizer(&api, FINALIZER, policy, |event| async {
        match event {
            Event::Apply(policy) => apply(&policy, &ctx).await,
            Event::Cleanup(policy) => cleanup(&policy, &ctx).await,
        }
    })
    .await
    .map_err(Error::finalizer)
}

pub fn error_policy(policy: Arc<VaultPolicy>, error: &Error, ctx: Arc<Context>) -> Action {
    let path = policy_path(&policy.name_any());
    super::handle_error(&policy, policy.status.clone(), error, &ctx, path)
}

async fn apply(policy: &VaultPolicy, ctx: &Context) -> Result<Action> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let name = policy.name_any();
    let path = policy_path(&name);
    let rules = policy.spec.rules.as_str();

    let observation = observe(ctx.sys.as_ref(), &name, rules).await?;
    let (ready, reason, message) = if !observation.exists {
        create(ctx.sys.as_ref(), &name, rules).await?;
        info!("Created policy {name}");
        (false, REASON_CREATING, format!("policy written to {path}"))
    } else if !observation.up_to_date {
        update(ctx.sys.as_ref(), &name, rules).await?;
        info!("Updated policy {name}");
        (false, REASON_UPDATING, format!("policy rewritten at {path}"))
    } else {
        (true, REASON_AVAILABLE, format!("policy at {path} matches its spec"))
    };

    let status = ResourceStatus::new(ready, reason, &message, policy.metadata.generation, &path);
    super::publish_status(ctx.client.clone(), policy, policy.status.as_ref(), &status).await?;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    Ok(Action::requeue(ctx.requeue_interval))
}

async fn cleanup(policy: &VaultPolicy, ctx: &Context) -> Result<Action> {
    let name = policy.name_any();
    delete(ctx.sys.as_ref(), &name).await?;
    info!("Deleted policy {name}");
    Ok(Action::await_change())
}

/// Read the remote policy and compare its rules to the spec. Only a
/// missing policy reports as absent; any other read failure propagates.
pub async fn observe(sys: &dyn SysOps, name: &str, desired_rules: &str) -> Result<Observation> {
    let Some(rules) = super::timed_vault_op(KIND, OP_READ, ERR_READ, sys.get_policy(name)).await?
    else {
        return Ok(Observation::ABSENT);
    };
    let up_to_date = rules == desired_rules;
    if !up_to_date {
        debug!("Policy {name} differs from its spec");
    }
    Ok(Observation {
        exists: true,
        up_to_date,
    })
}

pub async fn create(sys: &dyn SysOps, name: &str, rules: &str) -> Result<()> {
    validate(name, rules)?;
    super::timed_vault_op(KIND, OP_WRITE, ERR_CREATE, sys.put_policy(name, rules)).await
}

pub async fn update(sys: &dyn SysOps, name: &str, rules: &str) -> Result<()> {
    validate(name, rules)?;
    super::timed_vault_op(KIND, OP_WRITE, ERR_UPDATE, sys.put_policy(name, rules)).await
}

pub async fn delete(sys: &dyn SysOps, name: &str) -> Result<()> {
    super::timed_vault_op(KIND, OP_DELETE, ERR_DELETE, sys.delete_policy(name)).await
}

fn validate(name: &str, rules: &str) -> Result<()> {
    if rules.trim().is_empty() {
        return Err(Error::validation(KIND, name, "rules must not be empty"));
    }
    Ok(())
}
