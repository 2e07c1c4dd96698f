//! Deep merge of configuration layers into the tree.
//!
//! Implements field-by-field merging where the layer merged later wins per
//! leaf. Tables are merged recursively; everything else (strings, numbers,
//! arrays) replaces the previous leaf entirely.

use super::attr::{Attr, Node, Tree};
use super::uri::UriResolver;
use serde_json::Value;
use std::collections::BTreeMap;

/// A value arriving from a configuration layer, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A plain value from a YAML document or a constructor override.
    Raw(Value),
    /// A value that already carries provenance (environment variables).
    Cell(Attr),
    /// A nested mapping to merge recursively.
    Table(BTreeMap<String, Incoming>),
}

impl Incoming {
    /// Convert an environment tree, keeping its cells.
    pub fn from_tree(tree: Tree) -> BTreeMap<String, Incoming> {
        tree.into_iter()
            .map(|(key, node)| (key, Incoming::from(node)))
            .collect()
    }

    /// Convert a JSON object into a merge source.
    pub fn from_map(map: serde_json::Map<String, Value>) -> BTreeMap<String, Incoming> {
        map.into_iter()
            .map(|(key, value)| (key, Incoming::from(value)))
            .collect()
    }
}

impl From<Value> for Incoming {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Incoming::Table(Incoming::from_map(map)),
            other => Incoming::Raw(other),
        }
    }
}

impl From<Node> for Incoming {
    fn from(node: Node) -> Self {
        match node {
            Node::Leaf(attr) => Incoming::Cell(attr),
            Node::Table(tree) => Incoming::Table(Incoming::from_tree(tree)),
        }
    }
}

/// Merge `source` into `dest`, with `source` taking precedence.
///
/// - Tables are merged recursively; a leaf in the way is replaced by a table
/// - Strings (plain or inside a cell) go through the URI resolver
/// - Other cells are stored as-is, other raw values get an unspecified source
/// - Every leaf overwrites whatever `dest` held at that key
///
/// # Example
/// ```
/// use serde_json::json;
/// use strata_config::config::{Incoming, Tree, UriResolver, merge, tree_to_value};
///
/// let resolver = UriResolver::default();
/// let mut tree = Tree::new();
/// let base = json!({"server": {"port": 8080, "host": "localhost"}});
/// let overlay = json!({"server": {"port": 9000}});
/// for layer in [base, overlay] {
///     if let Incoming::Table(layer) = Incoming::from(layer) {
///         merge(&mut tree, layer, &resolver);
///     }
/// }
/// assert_eq!(
///     tree_to_value(&tree),
///     json!({"server": {"port": 9000, "host": "localhost"}})
/// );
/// ```
pub fn merge(dest: &mut Tree, source: BTreeMap<String, Incoming>, resolver: &UriResolver) {
    for (key, incoming) in source {
        let node = match incoming {
            Incoming::Table(nested) => {
                let mut table = match dest.remove(&key) {
                    Some(Node::Table(existing)) => existing,
                    _ => Tree::new(),
                };
                merge(&mut table, nested, resolver);
                Node::Table(table)
            }
            Incoming::Raw(Value::String(raw)) => Node::Leaf(resolver.resolve(&raw)),
            Incoming::Cell(attr) => {
                if let Some(raw) = attr.value().as_str() {
                    Node::Leaf(resolver.resolve(raw))
                } else {
                    Node::Leaf(attr)
                }
            }
            Incoming::Raw(other) => Node::Leaf(Attr::new(other)),
        };
        dest.insert(key, node);
    }
}
