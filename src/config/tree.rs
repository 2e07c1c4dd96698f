//! The resolved configuration tree and its typed accessors.

use super::attr::{Attr, Node, Tree, tree_to_value};
use super::deprecations::Deprecation;
use super::path::{DEFAULT_SEP, get_path, get_path_mut, pop_path, set_path};
use super::uri::UriResolver;
use crate::error::ConfigResult;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Merged configuration, built once at startup by
/// [`ConfigLoader`](super::ConfigLoader).
///
/// Reads take `&self` and are safe to share across threads. Mutation
/// (`set`, `patch`, `refresh`) needs `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct Config {
    tree: Tree,
    resolver: UriResolver,
    deprecations: Vec<Deprecation>,
}

impl Config {
    /// Load configuration with the default search paths and the process
    /// environment.
    pub fn load() -> ConfigResult<Self> {
        super::ConfigLoader::new().load()
    }

    pub(crate) fn from_parts(tree: Tree, resolver: UriResolver, deprecations: Vec<Deprecation>) -> Self {
        Self {
            tree,
            resolver,
            deprecations,
        }
    }

    /// The raw tree, with provenance.
    pub fn raw(&self) -> &Tree {
        &self.tree
    }

    /// The whole tree as plain JSON.
    pub fn to_json(&self) -> Value {
        tree_to_value(&self.tree)
    }

    /// Keys migrated away from deprecated paths during load.
    pub fn deprecations(&self) -> &[Deprecation] {
        &self.deprecations
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        get_path(&self.tree, path, DEFAULT_SEP)
    }

    /// The cell at `path`, if `path` names a leaf.
    pub fn attr(&self, path: &str) -> Option<&Attr> {
        self.node(path).and_then(Node::as_attr)
    }

    /// Value at `path`. Tables are returned as JSON objects.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.node(path).map(Node::to_value)
    }

    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// String value at `path`, if it is a string leaf.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.attr(path).and_then(|attr| attr.value().as_str())
    }

    /// Value at `path` coerced to an integer.
    ///
    /// Numeric strings are parsed, floats truncated and booleans map to 0/1.
    /// Anything else logs a warning and yields `default`.
    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        let Some(attr) = self.attr(path) else {
            if self.node(path).is_some() {
                warn!(path = %path, "Failed to parse config as int: value is a table");
            }
            return default;
        };
        match coerce_int(attr.value()) {
            Ok(value) => value,
            Err(reason) => {
                warn!(path = %path, exc = %reason, "Failed to parse config as int");
                default
            }
        }
    }

    /// Value at `path` coerced to a boolean.
    ///
    /// Only `true` and strings equal to `"true"` (any case) are true.
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        let Some(node) = self.node(path) else {
            return default;
        };
        match node {
            Node::Leaf(attr) => match attr.value() {
                Value::Bool(value) => *value,
                Value::String(value) => value.eq_ignore_ascii_case("true"),
                _ => false,
            },
            Node::Table(_) => false,
        }
    }

    /// Decode a base64-encoded JSON object stored at `path`.
    ///
    /// Absent or null values give an empty map. Decoding or parsing failures
    /// log a warning and give `default`, or an empty map without one.
    pub fn get_dict_from_b64_json(
        &self,
        path: &str,
        default: Option<Map<String, Value>>,
    ) -> Map<String, Value> {
        let value = match self.get(path) {
            None | Some(Value::Null) => return Map::new(),
            Some(value) => value,
        };
        match decode_b64_json(&value) {
            Ok(map) => map,
            Err(reason) => {
                warn!(
                    path = %path,
                    "Ignored invalid configuration for '{}' due to exception: {}",
                    path,
                    reason
                );
                default.unwrap_or_default()
            }
        }
    }

    /// Set `path` to `value`, replacing whatever was there.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        set_path(&mut self.tree, path, Attr::new(value), DEFAULT_SEP);
    }

    /// Re-resolve a URI-sourced value, e.g. after a `file://` secret rotated.
    ///
    /// Returns `false` without touching anything when `path` is not a leaf or
    /// its value did not come from a URI.
    pub fn refresh(&mut self, path: &str) -> bool {
        let Some(Node::Leaf(attr)) = get_path_mut(&mut self.tree, path, DEFAULT_SEP) else {
            return false;
        };
        let Some(raw) = attr.source().uri() else {
            return false;
        };
        let fresh = self.resolver.resolve(raw).into_value();
        attr.replace_value(fresh);
        true
    }

    /// Temporarily set `path` to `value`.
    ///
    /// The previous state is restored when the returned guard is dropped,
    /// including during a panic unwind.
    pub fn patch(&mut self, path: &str, value: impl Into<Value>) -> PatchGuard<'_> {
        PatchGuard::new(self, path, value.into())
    }

    /// Run `f` with `path` temporarily set to `value`.
    pub fn with_patch<R>(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        f: impl FnOnce(&Config) -> R,
    ) -> R {
        let guard = self.patch(path, value);
        f(&*guard)
    }
}

/// Restores a patched value when dropped.
///
/// The whole top-level section containing the patched path is snapshotted, so
/// tables created by the patch disappear again on restore. Guards can be
/// nested through `DerefMut`; they unwind innermost first. Changes made
/// through the guard to the same section are reverted with it, changes to
/// other sections are kept.
#[must_use = "the patch is reverted as soon as the guard is dropped"]
pub struct PatchGuard<'a> {
    config: &'a mut Config,
    section: String,
    original: Option<Node>,
}

impl<'a> PatchGuard<'a> {
    fn new(config: &'a mut Config, path: &str, value: Value) -> Self {
        let section = path.split(DEFAULT_SEP).next().unwrap_or(path).to_string();
        let original = config.tree.get(&section).cloned();
        config.set(path, value);
        Self {
            config,
            section,
            original,
        }
    }
}

impl Deref for PatchGuard<'_> {
    type Target = Config;

    fn deref(&self) -> &Config {
        &*self.config
    }
}

impl DerefMut for PatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Config {
        &mut *self.config
    }
}

impl Drop for PatchGuard<'_> {
    fn drop(&mut self) {
        match self.original.take() {
            Some(node) => {
                self.config.tree.insert(self.section.clone(), node);
            }
            None => {
                pop_path(&mut self.config.tree, &self.section, DEFAULT_SEP);
            }
        }
    }
}

fn coerce_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                Ok(f.trunc() as i64)
            } else {
                Err(format!("{n} is out of range"))
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => {
            let cleaned = s.trim().replace('_', "");
            cleaned
                .parse::<i64>()
                .map_err(|e| format!("invalid literal for int(): '{s}': {e}"))
        }
        Value::Null => Err("value is null".to_string()),
        other => Err(format!("cannot convert {other} to int")),
    }
}

fn decode_b64_json(value: &Value) -> Result<Map<String, Value>, String> {
    let encoded = value
        .as_str()
        .ok_or_else(|| format!("expected a base64 string, got {value}"))?;
    // Accept line-wrapped input.
    let compact: String = encoded.split_ascii_whitespace().collect();
    let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    let decoded = String::from_utf8(bytes).map_err(|e| e.to_string())?;
    let inner = decoded.trim();
    let inner = inner.strip_prefix('{').unwrap_or(inner);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    serde_json::from_str(&format!("{{{inner}}}")).map_err(|e| e.to_string())
}
