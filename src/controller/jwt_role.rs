//! # JwtRole Reconciler
//!
//! Reconciles [`JwtRole`] objects against `auth/{backend}/role/{name}` on
//! the Vault server. A finalizer removes the role from Vault when the
//! Kubernetes object is deleted.

use std::sync::Arc;
use std::time::Instant;

use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event};
use tracing::{debug, info};

use super::{Context, Observation, OP_DELETE, OP_READ, OP_WRITE};
use crate::crd::{
    JwtRole, JwtRoleSpec, ResourceStatus, REASON_AVAILABLE, REASON_CREATING, REASON_UPDATING,
};
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::vault::jwt_role::{self, JwtRoleRecord};
use crate::vault::LogicalOps;

pub const FINALIZER: &str = "vault.microscaler.io/jwt-role-cleanup";

const KIND: &str = "JwtRole";

const ERR_READ: &str = "cannot read JWT/OIDC role";
const ERR_CREATE: &str = "cannot create JWT/OIDC role";
const ERR_UPDATE: &str = "cannot update JWT/OIDC role";
const ERR_DELETE: &str = "cannot delete JWT/OIDC role";

/// Vault API path of the role declared by this spec.
pub fn role_path(spec: &JwtRoleSpec, name: &str) -> String {
    format!(
        "auth/{}/role/{}",
        super::trim_path(&spec.backend),
        super::trim_path(name)
    )
}

pub async fn reconcile(role: Arc<JwtRole>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = role
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(role.name_any()))?;
    let api: Api<JwtRole> = Api::namespaced(ctx.client.clone(), &namespace);

    finalizer(&api, FINALIZER, role, |event| async {
        match event {
            Event::Apply(role) => apply(&role, &ctx).await,
            Event::Cleanup(role) => cleanup(&role, &ctx).await,
        }
    })
    .await
    .map_err(Error::finalizer)
}

pub fn error_policy(role: Arc<JwtRole>, error: &Error, ctx: Arc<Context>) -> Action {
    let path = role_path(&role.spec, &role.name_any());
    super::handle_error(&role, role.status.clone(), error, &ctx, path)
}

async fn apply(role: &JwtRole, ctx: &Context) -> Result<Action> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let name = role.name_any();
    let path = role_path(&role.spec, &name);
    let desired = JwtRoleRecord::from_params(&name, &role.spec);

    let observation = observe(ctx.logical.as_ref(), &path, &desired).await?;
    let (ready, reason, message) = if !observation.exists {
        create(ctx.logical.as_ref(), &path, &desired).await?;
        info!("Created JWT/OIDC role {name} at {path}");
        (false, REASON_CREATING, format!("role written to {path}"))
    } else if !observation.up_to_date {
        update(ctx.logical.as_ref(), &path, &desired).await?;
        info!("Updated JWT/OIDC role {name} at {path}");
        (false, REASON_UPDATING, format!("role rewritten at {path}"))
    } else {
        (true, REASON_AVAILABLE, format!("role at {path} matches its spec"))
    };

    let status = ResourceStatus::new(ready, reason, &message, role.metadata.generation, &path);
    super::publish_status(ctx.client.clone(), role, role.status.as_ref(), &status).await?;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    Ok(Action::requeue(ctx.requeue_interval))
}

async fn cleanup(role: &JwtRole, ctx: &Context) -> Result<Action> {
    let name = role.name_any();
    let path = role_path(&role.spec, &name);
    delete(ctx.logical.as_ref(), &path).await?;
    info!("Deleted JWT/OIDC role {name} at {path}");
    Ok(Action::await_change())
}

/// Read the remote role and compare it to the desired record. Only a
/// missing role reports as absent; any other read failure propagates, so
/// an unreachable Vault never looks like a role waiting to be created.
pub async fn observe(
    logical: &dyn LogicalOps,
    path: &str,
    desired: &JwtRoleRecord,
) -> Result<Observation> {
    let Some(data) = super::timed_vault_op(KIND, OP_READ, ERR_READ, logical.read(path)).await?
    else {
        return Ok(Observation::ABSENT);
    };
    let actual = JwtRoleRecord::from_wire(path, &data)?;
    let up_to_date = jwt_role::up_to_date(desired, &actual);
    if !up_to_date {
        if let Some(field) = jwt_role::first_difference(desired, &actual) {
            debug!("JWT/OIDC role at {path} differs from spec in {field}");
        }
    }
    Ok(Observation {
        exists: true,
        up_to_date,
    })
}

pub async fn create(logical: &dyn LogicalOps, path: &str, desired: &JwtRoleRecord) -> Result<()> {
    desired.validate()?;
    super::timed_vault_op(KIND, OP_WRITE, ERR_CREATE, logical.write(path, desired.to_wire())).await
}

pub async fn update(logical: &dyn LogicalOps, path: &str, desired: &JwtRoleRecord) -> Result<()> {
    desired.validate()?;
    super::timed_vault_op(KIND, OP_WRITE, ERR_UPDATE, logical.write(path, desired.to_wire())).await
}

pub async fn delete(logical: &dyn LogicalOps, path: &str) -> Result<()> {
    super::timed_vault_op(KIND, OP_DELETE, ERR_DELETE, logical.delete(path)).await
}
