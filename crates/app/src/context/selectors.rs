//! Lookups over the asset list returned by `assets/list`
//!
//! Assets are kept as raw JSON; only the fields a lookup needs are read.

use std::cmp::Ordering;

use mdrkit_infra::ApiError;
use rand::seq::SliceRandom;
use serde_json::Value;

fn text<'a>(asset: &'a Value, field: &str) -> &'a str {
    asset.get(field).and_then(Value::as_str).unwrap_or_default()
}

/// `needle` occurs in `haystack`: substring of a string, element of a list,
/// key of an object.
fn contains(haystack: Option<&Value>, needle: &str) -> bool {
    match haystack {
        Some(Value::String(s)) => s.contains(needle),
        Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(needle)),
        Some(Value::Object(map)) => map.contains_key(needle),
        _ => false,
    }
}

/// Numbers compare numerically, anything else by its string form.
fn by_last_seen(a: &Value, b: &Value) -> Ordering {
    match (a.get("last_seen"), b.get("last_seen")) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (x, y) => {
            let key = |v: Option<&Value>| v.map(ToString::to_string).unwrap_or_default();
            key(x).cmp(&key(y))
        }
    }
}

pub(crate) fn asset_id(asset: &Value) -> Result<String, ApiError> {
    asset
        .get("asset_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Client(format!("asset without asset_id: {asset}")))
}

pub(crate) fn find_by_hostname<'a>(assets: &'a [Value], host_name: &str) -> Option<&'a Value> {
    assets.iter().find(|asset| text(asset, "host_name") == host_name)
}

/// Assets whose `host_name` contains `name` in upper case. Host names are
/// registered upper case, so stored lower-case names never match.
pub(crate) fn filter_by_hostname(assets: Vec<Value>, name: &str) -> Vec<Value> {
    let name = name.to_uppercase();
    assets.into_iter().filter(|asset| text(asset, "host_name").contains(&name)).collect()
}

pub(crate) fn latest_seen(assets: &[Value]) -> Option<&Value> {
    assets.iter().max_by(|a, b| by_last_seen(a, b))
}

/// Assets running `platform` with `product` installed, oldest `last_seen` first
pub(crate) fn filter_by_platform(assets: Vec<Value>, platform: &str, product: &str) -> Vec<Value> {
    let mut matching: Vec<Value> = assets
        .into_iter()
        .filter(|asset| {
            contains(asset.get("os_version"), platform)
                && contains(asset.get("product_map"), product)
        })
        .collect();
    matching.sort_by(by_last_seen);
    matching
}

pub(crate) fn hostnames_with_status(assets: &[Value], status: &str) -> Vec<String> {
    assets
        .iter()
        .filter(|asset| contains(asset.get("status"), status))
        .map(|asset| text(asset, "host_name").to_string())
        .collect()
}

pub(crate) fn pick_random(assets: &[Value]) -> Option<&Value> {
    assets.choose(&mut rand::thread_rng())
}

/// A list payload as its items; `null` counts as an empty page.
pub(crate) fn into_items(payload: Value, action: &str) -> Result<Vec<Value>, ApiError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::Client(format!("{action} did not return a list: {other}"))),
    }
}

pub(crate) fn count_field(payload: &Value, action: &str) -> Result<u64, ApiError> {
    payload
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| ApiError::Client(format!("{action} returned no count: {payload}")))
}
