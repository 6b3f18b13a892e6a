//! # Local Reference Pointers
//!
//! Helpers for `#/a/b/c` style `$ref` values. Only references local to the
//! current document are understood; anything else is rejected.

use crate::error::{AppError, AppResult};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Splits a local `$ref` into decoded pointer segments.
///
/// `#/components/parameters/Limit` becomes `["components", "parameters", "Limit"]`.
/// Empty segments are dropped so that `#/a//b/` walks like `#/a/b`.
pub(crate) fn parse_local_ref(ref_str: &str) -> AppResult<Vec<String>> {
    let Some(pointer) = ref_str.strip_prefix("#/") else {
        return Err(AppError::UnsupportedReference(ref_str.to_string()));
    };
    Ok(pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_pointer_segment)
        .collect())
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Follows decoded segments from `root`. Arrays are indexed numerically.
pub(crate) fn walk_pointer<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
