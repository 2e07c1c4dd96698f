//! Environment variable ingestion.
//!
//! A variable like `STRATA_POSTGRESQL__HOST` translates to the dotted path
//! `postgresql.host`. Values are parsed as JSON when possible so lists,
//! numbers and booleans can be passed through the environment.

use super::attr::{Attr, Source, Tree};
use super::path::{DEFAULT_SEP, set_path};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default prefix for configuration environment variables.
pub const DEFAULT_ENV_PREFIX: &str = "STRATA";

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    /// The live process environment. Non-UTF-8 entries are ignored.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(BTreeMap<String, String>),
}

impl Environment {
    pub fn process() -> Self {
        Environment::Process
    }

    /// A fixed environment with no variables at all.
    pub fn empty() -> Self {
        Environment::Fixed(BTreeMap::new())
    }

    /// Build a fixed environment from name/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Environment::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a single variable.
    pub fn var(&self, name: &str) -> Option<String> {
        match self {
            Environment::Process => std::env::var(name).ok(),
            Environment::Fixed(vars) => vars.get(name).cloned(),
        }
    }

    /// All variables, sorted by name.
    pub fn vars(&self) -> BTreeMap<String, String> {
        match self {
            Environment::Process => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
            Environment::Fixed(vars) => vars.clone(),
        }
    }
}

/// Map an environment variable name to a dotted config path.
///
/// Returns `None` when the name does not carry `<prefix>_` or nothing is left
/// after stripping it.
pub fn env_key_to_path(key: &str, prefix: &str) -> Option<String> {
    let relative = key.strip_prefix(prefix)?.strip_prefix('_')?;
    if relative.is_empty() {
        return None;
    }
    Some(relative.replace("__", DEFAULT_SEP).to_lowercase())
}

/// Parse a raw environment value, falling back to the plain string.
pub fn parse_env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Collect every `<prefix>_*` variable into a fresh tree.
///
/// Variables are visited in name order, so when `STRATA_A=1` and
/// `STRATA_A__B=2` collide the nested table wins. Returns the tree and the
/// number of variables ingested.
pub fn ingest(env: &Environment, prefix: &str) -> (Tree, usize) {
    let mut tree = Tree::new();
    let mut count = 0;
    for (key, raw) in env.vars() {
        let Some(path) = env_key_to_path(&key, prefix) else {
            continue;
        };
        let attr = Attr::with_source(parse_env_value(&raw), Source::Env(path.clone()));
        set_path(&mut tree, &path, attr, DEFAULT_SEP);
        count += 1;
    }
    (tree, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::attr::{Node, SourceKind, tree_to_value};
    use crate::config::path::get_path;
    use serde_json::json;

    #[test]
    fn test_env_key_to_path() {
        assert_eq!(
            env_key_to_path("STRATA_POSTGRESQL__HOST", "STRATA").as_deref(),
            Some("postgresql.host")
        );
        assert_eq!(
            env_key_to_path("STRATA_LOG_LEVEL", "STRATA").as_deref(),
            Some("log_level")
        );
        assert_eq!(
            env_key_to_path("STRATA_FOO__BAR__BAZ", "STRATA").as_deref(),
            Some("foo.bar.baz")
        );
        assert_eq!(env_key_to_path("STRATA_", "STRATA"), None);
        assert_eq!(env_key_to_path("STRATAFOO", "STRATA"), None);
        assert_eq!(env_key_to_path("OTHER_FOO", "STRATA"), None);
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("1"), json!(1));
        assert_eq!(parse_env_value("true"), json!(true));
        assert_eq!(parse_env_value("[\"a\", \"b\"]"), json!(["a", "b"]));
        assert_eq!(parse_env_value("{\"x\": 1}"), json!({"x": 1}));
        assert_eq!(parse_env_value("localhost"), json!("localhost"));
        assert_eq!(parse_env_value(""), json!(""));
    }

    #[test]
    fn test_ingest_builds_tree_with_env_source() {
        let env = Environment::from_vars([
            ("STRATA_POSTGRESQL__HOST", "db.internal"),
            ("STRATA_POSTGRESQL__PORT", "6432"),
            ("STRATA_DEBUG", "true"),
            ("HOME", "/root"),
        ]);
        let (tree, count) = ingest(&env, "STRATA");
        assert_eq!(count, 3);
        assert_eq!(
            tree_to_value(&tree),
            json!({"postgresql": {"host": "db.internal", "port": 6432}, "debug": true})
        );

        let Some(Node::Leaf(attr)) = get_path(&tree, "postgresql.host", ".") else {
            panic!("expected a leaf at postgresql.host");
        };
        assert_eq!(attr.source_kind(), SourceKind::Env);
        assert_eq!(attr.source_detail().as_deref(), Some("postgresql.host"));
    }

    #[test]
    fn test_ingest_without_matches() {
        let env = Environment::from_vars([("PATH", "/usr/bin")]);
        let (tree, count) = ingest(&env, "STRATA");
        assert_eq!(count, 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_ingest_collision_is_deterministic() {
        let env = Environment::from_vars([("STRATA_A__B", "2"), ("STRATA_A", "1")]);
        let (tree, count) = ingest(&env, "STRATA");
        assert_eq!(count, 2);
        assert_eq!(tree_to_value(&tree), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_fixed_environment_lookup() {
        let env = Environment::from_vars([("TOKEN", "abc")]);
        assert_eq!(env.var("TOKEN").as_deref(), Some("abc"));
        assert_eq!(env.var("MISSING"), None);
    }
}
