//! Work items and destination key derivation.
//!
//! The recursive source enumeration (folder trees, version stacks,
//! pagination) lives outside this crate; what reaches the engine is a flat
//! list of work items, each one source object to relay.

use serde::{Deserialize, Serialize};

/// One unit of relay work as produced by the external enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// HTTP(S) URL the object can be read from.
    pub url: String,
    /// Object name, used to derive the destination key.
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
}

/// Joins the configured upload prefix and an item name with exactly one
/// separator. An empty prefix maps the name straight to the bucket root.
pub fn destination_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}/{name}")
    }
}
