//! Helpers for decoding `serde_json::Value` payloads returned by a [`Transport`].
//!
//! [`Transport`]: crate::Transport

use serde_json::Value;

use crate::constants::{STATE_DISABLED, STATE_ENABLED};
use crate::{Error, Result};

pub fn as_string(value: &Value, what: &str) -> Result<String> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| Error::unexpected(format!("{what}: expected string, got {value}")))
}

/// Like [`as_string`], but maps `null` to `None`.
pub fn as_opt_string(value: &Value, what: &str) -> Result<Option<String>> {
    if value.is_null() {
        Ok(None)
    } else {
        as_string(value, what).map(Some)
    }
}

pub fn as_u64(value: &Value, what: &str) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| Error::unexpected(format!("{what}: expected unsigned integer, got {value}")))
}

pub fn as_u32(value: &Value, what: &str) -> Result<u32> {
    let raw = as_u64(value, what)?;
    u32::try_from(raw).map_err(|_| Error::unexpected(format!("{what}: {raw} out of range")))
}

pub fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::unexpected(format!("{what}: expected array, got {value}")))
}

/// First element of an array result, as returned by single-object calls.
pub fn first<'a>(value: &'a Value, what: &str) -> Result<&'a Value> {
    as_array(value, what)?
        .first()
        .ok_or_else(|| Error::unexpected(format!("{what}: empty result")))
}

/// Array result with exactly `len` elements, as returned by batched calls.
pub fn exact<'a>(value: &'a Value, len: usize, what: &str) -> Result<&'a [Value]> {
    let items = as_array(value, what)?;
    if items.len() == len {
        Ok(items)
    } else {
        Err(Error::unexpected(format!(
            "{what}: expected {len} results, got {}",
            items.len()
        )))
    }
}

pub fn string_list(value: &Value, what: &str) -> Result<Vec<String>> {
    as_array(value, what)?
        .iter()
        .map(|item| as_string(item, what))
        .collect()
}

/// Encode a boolean as `Common::EnabledState`.
#[must_use]
pub const fn enabled_state(enabled: bool) -> &'static str {
    if enabled { STATE_ENABLED } else { STATE_DISABLED }
}

/// Decode `Common::EnabledState`.
pub fn parse_enabled_state(value: &Value, what: &str) -> Result<bool> {
    match value.as_str() {
        Some(STATE_ENABLED) => Ok(true),
        Some(STATE_DISABLED) => Ok(false),
        _ => Err(Error::unexpected(format!("{what}: unknown state {value}"))),
    }
}
