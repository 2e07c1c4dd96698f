//! Migration of deprecated configuration keys.
//!
//! Runs once after every layer is merged, so a deprecated key is caught no
//! matter which file or variable set it.

use super::attr::{Attr, Node, Tree};
use super::path::{DEFAULT_SEP, pop_path, set_path};
use tracing::warn;

/// Deprecated dotted paths and their replacements.
pub const DEPRECATIONS: &[(&str, &str)] = &[
    ("geoip", "events.context_processors.geoip"),
    ("redis.broker_url", "broker.url"),
    ("redis.broker_transport_options", "broker.transport_options"),
    ("redis.cache_timeout", "cache.timeout"),
    ("redis.cache_timeout_flows", "cache.timeout_flows"),
    ("redis.cache_timeout_policies", "cache.timeout_policies"),
    ("redis.cache_timeout_reputation", "cache.timeout_reputation"),
];

/// Audit record for a key that was moved during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub old: String,
    pub new: String,
}

impl Deprecation {
    pub fn message(&self) -> String {
        format!(
            "'{}' has been deprecated in favor of '{}'! Please update your configuration.",
            self.old, self.new
        )
    }
}

impl std::fmt::Display for Deprecation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Move every present deprecated key in `table` to its replacement.
///
/// A deprecated leaf is re-set at the new path as a plain value; a deprecated
/// table is moved as-is. Empty parents of the old path are pruned. Returns one
/// record per migrated key.
pub fn migrate_deprecations(tree: &mut Tree, table: &[(&str, &str)]) -> Vec<Deprecation> {
    let mut migrated = Vec::new();
    for (old, new) in table {
        let Some(node) = pop_path(tree, old, DEFAULT_SEP) else {
            continue;
        };
        let record = Deprecation {
            old: (*old).to_string(),
            new: (*new).to_string(),
        };
        warn!(deprecated = %old, replacement = %new, "{}", record.message());

        let node = match node {
            Node::Leaf(attr) => Node::Leaf(Attr::new(attr.into_value())),
            table => table,
        };
        set_path(tree, new, node, DEFAULT_SEP);
        migrated.push(record);
    }
    migrated
}
