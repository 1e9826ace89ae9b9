//! Coercion helpers shared by the typed wire records.
//!
//! Reads are lenient about representation but strict about kind: a numeric
//! field accepts `3600`, `3600.0`, and `"3600"` (Vault reports durations in
//! all three shapes depending on engine and version), but a list where a
//! string is expected aborts the decode. Missing keys and JSON `null` decode
//! to the field's zero value.

use std::collections::BTreeMap;

use serde_json::Value;

use super::VaultData;
use crate::error::Error;

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn string_field(path: &str, data: &VaultData, key: &'static str) -> Result<String, Error> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::decode(
            path,
            key,
            format!("expected string, got {}", kind_of(other)),
        )),
    }
}

pub(crate) fn bool_field(path: &str, data: &VaultData, key: &'static str) -> Result<bool, Error> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(Error::decode(
            path,
            key,
            format!("expected boolean, got {}", kind_of(other)),
        )),
    }
}

pub(crate) fn int_field(path: &str, data: &VaultData, key: &'static str) -> Result<i64, Error> {
    let value = match data.get(key) {
        None | Some(Value::Null) => return Ok(0),
        Some(value) => value,
    };
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            // Vault reports integral durations as floats in some engines.
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    #[allow(clippy::cast_possible_truncation, reason = "fract checked above")]
                    return Ok(f as i64);
                }
            }
            Err(Error::decode(path, key, format!("number {n} is not an integer")))
        }
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| Error::decode(path, key, format!("string {s:?} is not an integer"))),
        other => Err(Error::decode(
            path,
            key,
            format!("expected number, got {}", kind_of(other)),
        )),
    }
}

pub(crate) fn string_list_field(
    path: &str,
    data: &VaultData,
    key: &'static str,
) -> Result<Vec<String>, Error> {
    let items = match data.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(Error::decode(
                path,
                key,
                format!("expected array, got {}", kind_of(other)),
            ))
        }
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(Error::decode(
                path,
                key,
                format!("expected array of strings, got element of kind {}", kind_of(other)),
            )),
        })
        .collect()
}

pub(crate) fn string_map_field(
    path: &str,
    data: &VaultData,
    key: &'static str,
) -> Result<BTreeMap<String, String>, Error> {
    let entries = match data.get(key) {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(Error::decode(
                path,
                key,
                format!("expected object, got {}", kind_of(other)),
            ))
        }
    };
    let mut map = BTreeMap::new();
    for (entry_key, value) in entries {
        let rendered = match value {
            Value::String(s) => s.clone(),
            // Vault flattens scalar claim values to strings on read-back.
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::decode(
                    path,
                    key,
                    format!("entry {entry_key:?} has unsupported kind {}", kind_of(other)),
                ))
            }
        };
        map.insert(entry_key.clone(), rendered);
    }
    Ok(map)
}

pub(crate) fn put_string(data: &mut VaultData, key: &str, value: &str) {
    data.insert(key.to_string(), Value::String(value.to_string()));
}

pub(crate) fn put_bool(data: &mut VaultData, key: &str, value: bool) {
    data.insert(key.to_string(), Value::Bool(value));
}

pub(crate) fn put_int(data: &mut VaultData, key: &str, value: i64) {
    data.insert(key.to_string(), Value::Number(value.into()));
}

pub(crate) fn put_string_list(data: &mut VaultData, key: &str, values: &[String]) {
    data.insert(
        key.to_string(),
        Value::Array(values.iter().map(|v| Value::String(v.clone())).collect()),
    );
}

pub(crate) fn put_string_map(data: &mut VaultData, key: &str, values: &BTreeMap<String, String>) {
    let mut object = VaultData::new();
    for (entry_key, value) in values {
        object.insert(entry_key.clone(), Value::String(value.clone()));
    }
    data.insert(key.to_string(), Value::Object(object));
}
