//! Response unwrapping. The backend wraps the same payload several ways
//! (bare array, `{data: [...]}`, `{data: {tickets: [...]}}`, `{tickets: [...]}`,
//! `{player: {...}}` vs `{token, user}`); every service boundary funnels its
//! body through here once so views only ever see one shape.

use crate::Identity;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract the record list for `resource` from any of the known envelopes.
/// Unknown shapes yield an empty list.
pub fn unwrap_list(body: Value, resource: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(resource) {
                return items;
            }
            match map.remove("data") {
                Some(Value::Array(items)) => items,
                Some(inner @ Value::Object(_)) => unwrap_list(inner, resource),
                _ => {
                    debug!("no `{resource}` list found in response envelope");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    }
}

/// Extract a single record for `resource`: `{resource: {...}}`,
/// `{data: {...}}`, or the object itself.
pub fn unwrap_item(body: Value, resource: &str) -> Value {
    match body {
        Value::Object(mut map) => {
            if let Some(item @ Value::Object(_)) = map.remove(resource) {
                return item;
            }
            if let Some(inner @ Value::Object(_)) = map.remove("data") {
                return unwrap_item(inner, resource);
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Decode a list, skipping records that don't fit the typed model.
pub fn decode_list<T: DeserializeOwned>(body: Value, resource: &str) -> Vec<T> {
    unwrap_list(body, resource)
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping malformed {resource} record: {e}");
                None
            }
        })
        .collect()
}

/// Identity plus bearer token from a login/register response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthPayload {
    pub identity: Identity,
    pub token: Option<String>,
}

/// Read `{player: ...}` / `{admin: ...}` (current contract) or the legacy
/// `{token, user}` shape, each optionally nested under `data`.
pub fn unwrap_auth(body: Value) -> Option<AuthPayload> {
    let body = match body {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("player")
            && !map.contains_key("admin") && !map.contains_key("user") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    let token = body
        .get("token")
        .or_else(|| body.get("accessToken"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    let record = ["player", "admin", "user"]
        .iter()
        .find_map(|key| body.get(*key).filter(|v| v.is_object()))?;

    let identity: Identity = serde_json::from_value(record.clone()).ok()?;
    Some(AuthPayload { identity, token })
}
