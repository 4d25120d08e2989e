//! Domain models for the nutrition practice.
//!
//! Field names on the wire follow the stored documents (`nombre`, `consultas`,
//! `userType`, ...). Missing fields and `null` values are defaulted here so the
//! rest of the crate never sees a partially-shaped document.

mod menu;
mod patient;
mod user;

pub use menu::*;
pub use patient::*;
pub use user::*;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read an embedded list, dropping falsy entries (`null`, `false`, `0`, `""`).
///
/// Dropped entries are logged: they point at a data-quality problem upstream.
/// Lists are written back whole, so the next consultation or task write for the
/// same parent stores the list without them. The warning is the only record left.
pub(crate) fn skip_falsy_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = entries.len();
    let kept = entries
        .into_iter()
        .filter(|entry| !is_falsy(entry))
        .map(|entry| serde_json::from_value(entry).map_err(D::Error::custom))
        .collect::<Result<Vec<T>, _>>()?;
    if kept.len() < total {
        tracing::warn!(dropped = total - kept.len(), "falsy entries in embedded list");
    }
    Ok(kept)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
