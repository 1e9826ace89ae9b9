//! # Error Types
//!
//! The controller-level error taxonomy. Client-level failures from the Vault
//! HTTP API live in [`crate::vault::VaultError`] and are wrapped here with an
//! operation context (`cannot read JWT/OIDC role`, `cannot delete policy`, ...)
//! before they reach the reconciler runtime.
//!
//! Retryability drives the requeue interval chosen by the error policy:
//! network and Kubernetes API failures are retried soon, while validation and
//! decode failures are terminal for the current spec and requeued on the
//! normal poll interval.

use thiserror::Error;

use crate::vault::VaultError;

/// Errors produced while reconciling a Vault resource.
#[derive(Debug, Error)]
pub enum Error {
    /// The desired spec violates a cross-field constraint that Vault would
    /// reject. No network call was attempted.
    #[error("invalid {kind} {name:?}: {message}")]
    Validation {
        /// Resource kind (`JwtRole`, `AwsRole`, ...).
        kind: &'static str,
        /// Name of the offending object.
        name: String,
        /// Constraint that failed.
        message: String,
    },

    /// A record read back from Vault could not be coerced into the typed
    /// wire record for its kind. The reconciliation pass is treated as
    /// failed; the exists/up-to-date state is not updated.
    #[error("cannot decode Vault record at {path:?}, field {field:?}: {message}")]
    Decode {
        /// Vault path the record was read from.
        path: String,
        /// Wire key that failed coercion.
        field: &'static str,
        /// What was found instead.
        message: String,
    },

    /// A Vault API call failed. The context names the operation that was in
    /// flight when the failure happened.
    #[error("{context}: {source}")]
    Vault {
        /// Static operation context, e.g. `cannot create JWT/OIDC role`.
        context: &'static str,
        #[source]
        source: VaultError,
    },

    /// A Kubernetes API call (status patch, finalizer update) failed.
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Finalizer handling failed in the controller runtime.
    #[error("finalizer error: {0}")]
    Finalizer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A managed object reached the reconciler without a namespace. All
    /// four kinds are namespaced, so this indicates a broken watch.
    #[error("resource {0:?} has no namespace")]
    MissingNamespace(String),

    /// The controller is misconfigured (missing Vault address/token,
    /// unparsable interval, ...).
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Validation failure for a named object.
    pub fn validation(
        kind: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Decode failure for a single wire field.
    pub fn decode(path: impl Into<String>, field: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            field,
            message: message.into(),
        }
    }

    /// Wrap a Vault client failure with the operation that triggered it.
    pub fn vault(context: &'static str, source: VaultError) -> Self {
        Self::Vault { context, source }
    }

    /// Wrap a finalizer runtime failure.
    pub fn finalizer<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Finalizer(Box::new(source))
    }

    /// Configuration failure.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether a retry without a spec change can plausibly succeed.
    ///
    /// Validation and decode failures are deterministic for a given spec
    /// and remote record, so they are requeued on the regular interval
    /// instead of the error interval.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Vault { .. } | Self::Kube(_) | Self::Finalizer(_) => true,
            Self::Validation { .. }
            | Self::Decode { .. }
            | Self::MissingNamespace(_)
            | Self::Config(_) => false,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
