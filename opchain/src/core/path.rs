//! Dot-separated paths into nested mappings.
//!
//! `"user.profile.name"` walks object keys one segment at a time. Lists and
//! scalars are never traversed.

use serde_json::Value;

/// Returns the value at `path`, or `None` if any segment is missing or a
/// non-mapping is reached before the last segment.
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Mutable variant of [`lookup`].
pub fn lookup_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object_mut()?.get_mut(key))
}
