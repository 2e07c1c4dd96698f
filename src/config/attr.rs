//! Value cells and the nested tree they live in.
//!
//! Every leaf of the configuration tree is an [`Attr`]: the resolved value plus
//! a [`Source`] describing where it came from. Non-leaf nodes are plain tables.
//! An `Attr` holds a `serde_json::Value`, so a cell can never wrap another cell.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A nested configuration mapping.
pub type Tree = BTreeMap<String, Node>;

/// Where a configuration value came from.
///
/// The payload depends on the variant: the dotted path for environment
/// variables, the file for config-file values, and the original indirection
/// string for URI-resolved values (kept so the value can be re-resolved).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Unspecified,
    Env(String),
    ConfigFile(PathBuf),
    Uri(String),
}

/// Classification of a [`Source`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Unspecified,
    Env,
    ConfigFile,
    Uri,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Unspecified => write!(f, "unspecified"),
            SourceKind::Env => write!(f, "env"),
            SourceKind::ConfigFile => write!(f, "config_file"),
            SourceKind::Uri => write!(f, "uri"),
        }
    }
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Unspecified => SourceKind::Unspecified,
            Source::Env(_) => SourceKind::Env,
            Source::ConfigFile(_) => SourceKind::ConfigFile,
            Source::Uri(_) => SourceKind::Uri,
        }
    }

    /// The original indirection string of a URI-resolved value.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Source::Uri(raw) => Some(raw),
            _ => None,
        }
    }

    /// The environment variable path, config file or original URI string.
    pub fn detail(&self) -> Option<String> {
        match self {
            Source::Unspecified => None,
            Source::Env(path) => Some(path.clone()),
            Source::ConfigFile(path) => Some(path.display().to_string()),
            Source::Uri(raw) => Some(raw.clone()),
        }
    }
}

/// A single resolved configuration value and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    value: Value,
    source: Source,
}

impl Attr {
    /// Wrap a value with an unspecified source.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            source: Source::Unspecified,
        }
    }

    pub fn with_source(value: impl Into<Value>, source: Source) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn source_detail(&self) -> Option<String> {
        self.source.detail()
    }

    /// Replace the value, keeping the source.
    pub(crate) fn replace_value(&mut self, value: Value) {
        self.value = value;
    }
}

/// A node of the configuration tree: either a leaf cell or a nested table.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Attr),
    Table(Tree),
}

impl Node {
    pub fn as_attr(&self) -> Option<&Attr> {
        match self {
            Node::Leaf(attr) => Some(attr),
            Node::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Tree> {
        match self {
            Node::Leaf(_) => None,
            Node::Table(tree) => Some(tree),
        }
    }

    /// Render the node as plain JSON, dropping provenance.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Leaf(attr) => attr.value.clone(),
            Node::Table(tree) => tree_to_value(tree),
        }
    }
}

impl From<Attr> for Node {
    fn from(attr: Attr) -> Self {
        Node::Leaf(attr)
    }
}

/// Render a whole tree as a JSON object, dropping provenance.
pub fn tree_to_value(tree: &Tree) -> Value {
    Value::Object(
        tree.iter()
            .map(|(key, node)| (key.clone(), node.to_value()))
            .collect(),
    )
}

// Serializes to the bare values so the tree can be dumped without provenance.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(attr) => attr.value.serialize(serializer),
            Node::Table(tree) => tree.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attr_defaults_to_unspecified() {
        let attr = Attr::new(42);
        assert_eq!(attr.value(), &json!(42));
        assert_eq!(attr.source_kind(), SourceKind::Unspecified);
        assert_eq!(attr.source_detail(), None);
    }

    #[test]
    fn test_source_detail() {
        let env = Attr::with_source("db", Source::Env("postgresql.host".into()));
        assert_eq!(env.source_kind(), SourceKind::Env);
        assert_eq!(env.source_detail().as_deref(), Some("postgresql.host"));

        let uri = Attr::with_source("secret", Source::Uri("file:///run/secret".into()));
        assert_eq!(uri.source_kind().to_string(), "uri");
        assert_eq!(uri.source_detail().as_deref(), Some("file:///run/secret"));

        let file = Source::ConfigFile(PathBuf::from("/etc/strata/config.yml"));
        assert_eq!(file.kind().to_string(), "config_file");
        assert_eq!(file.detail().as_deref(), Some("/etc/strata/config.yml"));
    }

    #[test]
    fn test_serialize_strips_provenance() {
        let mut inner = Tree::new();
        inner.insert(
            "host".to_string(),
            Node::Leaf(Attr::with_source("db", Source::Env("postgresql.host".into()))),
        );
        inner.insert("port".to_string(), Node::Leaf(Attr::new(5432)));
        let mut tree = Tree::new();
        tree.insert("postgresql".to_string(), Node::Table(inner));

        let serialized = serde_json::to_value(&tree).unwrap();
        assert_eq!(serialized, json!({"postgresql": {"host": "db", "port": 5432}}));
        assert_eq!(tree_to_value(&tree), serialized);
    }
}
