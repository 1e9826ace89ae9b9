//! # Generic Secret Record
//!
//! Wire record for key/value secrets written to an arbitrary path
//! (`{backend}/{path}`), in the style of a KV version 1 store. The payload
//! is the user's JSON document verbatim; the store has no server-managed
//! keys, so the remote secret must equal the desired document exactly. In
//! particular a key removed from the spec makes the secret outdated, which
//! a subset comparison would never notice.

use serde_json::Value;

use super::VaultData;
use crate::crd::GenericSecretSpec;
use crate::error::Error;

const KIND: &str = "GenericSecret";

/// Desired or observed payload of one secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub data: VaultData,
}

impl SecretRecord {
    /// Parse the spec's JSON document. Anything but a JSON object is
    /// rejected, since Vault stores secrets as string-keyed maps.
    pub fn from_params(name: &str, spec: &GenericSecretSpec) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(&spec.data_json).map_err(|e| {
            Error::validation(KIND, name, format!("data_json is not valid JSON: {e}"))
        })?;
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(Error::validation(
                KIND,
                name,
                format!("data_json must be a JSON object, got {}", super::wire::kind_of(&other)),
            )),
        }
    }

    pub fn from_wire(data: &VaultData) -> Self {
        Self { data: data.clone() }
    }

    pub fn to_wire(&self) -> VaultData {
        self.data.clone()
    }
}

/// Structural equality that tolerates integer/float representation drift:
/// the store may hand numbers back in a different JSON notation than they
/// were written in, and `3600` versus `3600.0` is not a real difference.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => l == r,
        },
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter().all(|(key, l_value)| {
                    r.get(key).is_some_and(|r_value| values_equal(l_value, r_value))
                })
        }
        (l, r) => l == r,
    }
}

/// Key of the first entry where the remote secret deviates from the desired
/// document, for debug logging. Keys present remotely but absent from the
/// desired document count as deviations too.
pub fn first_difference(desired: &SecretRecord, actual: &SecretRecord) -> Option<String> {
    for (key, desired_value) in &desired.data {
        match actual.data.get(key) {
            Some(actual_value) if values_equal(desired_value, actual_value) => {}
            _ => return Some(key.clone()),
        }
    }
    actual
        .data
        .keys()
        .find(|key| !desired.data.contains_key(key.as_str()))
        .cloned()
}

pub fn up_to_date(desired: &SecretRecord, actual: &SecretRecord) -> bool {
    first_difference(desired, actual).is_none()
}
