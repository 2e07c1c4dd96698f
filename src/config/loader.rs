//! Configuration loader.
//!
//! Runs the load sequence once, in a fixed order:
//! 1. every search path entry (bundled defaults, files, directories)
//! 2. `<PREFIX>_*` environment variables
//! 3. constructor overrides, in the order they were added
//! 4. deprecated key migration

use super::attr::Tree;
use super::deprecations::{DEPRECATIONS, migrate_deprecations};
use super::env::{DEFAULT_ENV_PREFIX, Environment, ingest};
use super::files::{
    BUNDLED_DEFAULTS, BUNDLED_ORIGIN, SearchPath, default_search_paths, expand_search_path,
    load_file, parse_document,
};
use super::merge::{Incoming, merge};
use super::tree::Config;
use super::uri::UriResolver;
use crate::error::ConfigResult;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment name used when `<PREFIX>_ENV` is not set.
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// Builder for a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    prefix: String,
    environment: Option<String>,
    base_dir: Option<PathBuf>,
    search_paths: Vec<SearchPath>,
    env: Environment,
    overrides: Vec<(String, Value)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with the standard search paths, the `STRATA` prefix and the
    /// process environment.
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            environment: None,
            base_dir: None,
            search_paths: default_search_paths(),
            env: Environment::process(),
            overrides: Vec::new(),
        }
    }

    /// Set the environment variable prefix (without the trailing `_`).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Force the environment name instead of reading `<PREFIX>_ENV`.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Directory that relative search paths are joined onto.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Replace the search path list.
    pub fn with_search_paths(mut self, search_paths: Vec<SearchPath>) -> Self {
        self.search_paths = search_paths;
        self
    }

    /// Read variables from `env` instead of the process environment.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Set a top-level key after files and environment are applied.
    ///
    /// Overrides are merged in the order they are added; mappings deep-merge
    /// like any other layer.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// The environment name that selects `<env>.yml` files.
    pub fn environment_name(&self) -> String {
        self.environment
            .clone()
            .or_else(|| self.env.var(&format!("{}_ENV", self.prefix)))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Run the full load sequence.
    pub fn load(self) -> ConfigResult<Config> {
        let resolver = UriResolver::new(self.env.clone());
        let environment = self.environment_name();
        let base_dir = self.base_dir();
        let mut tree = Tree::new();

        for search_path in &self.search_paths {
            match search_path {
                SearchPath::Bundled => {
                    let map = parse_document(BUNDLED_DEFAULTS, BUNDLED_ORIGIN)?;
                    merge_map(&mut tree, map, &resolver);
                    debug!(path = BUNDLED_ORIGIN, "Loaded config");
                }
                SearchPath::Path(path) => {
                    self.load_path(&mut tree, path, &base_dir, &environment, &resolver)?;
                }
            }
        }

        let (env_tree, count) = ingest(&self.env, &self.prefix);
        if count > 0 {
            debug!(count, "Loaded environment variables");
            merge(&mut tree, Incoming::from_tree(env_tree), &resolver);
        }

        for (key, value) in self.overrides {
            let mut layer = Map::new();
            layer.insert(key, value);
            merge_map(&mut tree, layer, &resolver);
        }

        let deprecations = migrate_deprecations(&mut tree, DEPRECATIONS);
        Ok(Config::from_parts(tree, resolver, deprecations))
    }

    fn load_path(
        &self,
        tree: &mut Tree,
        path: &Path,
        base_dir: &Path,
        environment: &str,
        resolver: &UriResolver,
    ) -> ConfigResult<()> {
        for file in expand_search_path(path, base_dir, environment) {
            if let Some(map) = load_file(&file)? {
                merge_map(tree, map, resolver);
            }
        }
        Ok(())
    }
}

fn merge_map(tree: &mut Tree, map: Map<String, Value>, resolver: &UriResolver) {
    merge(tree, Incoming::from_map(map), resolver);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn isolated(temp: &TempDir) -> ConfigLoader {
        ConfigLoader::new()
            .with_base_dir(temp.path())
            .with_search_paths(vec![SearchPath::path("")])
            .with_env(Environment::empty())
    }

    #[test]
    fn test_environment_name() {
        let loader = ConfigLoader::new().with_env(Environment::from_vars([("STRATA_ENV", "prod")]));
        assert_eq!(loader.environment_name(), "prod");

        let loader = loader.with_environment("staging");
        assert_eq!(loader.environment_name(), "staging");

        let loader = ConfigLoader::new().with_env(Environment::from_vars([("OTHER", "x")]));
        assert_eq!(loader.environment_name(), DEFAULT_ENVIRONMENT);

        let loader = ConfigLoader::new()
            .with_prefix("APP")
            .with_env(Environment::from_vars([("APP_ENV", "ci")]));
        assert_eq!(loader.environment_name(), "ci");
    }

    #[test]
    fn test_load_empty() {
        let temp = TempDir::new().unwrap();
        let config = isolated(&temp).load().unwrap();
        assert!(config.raw().is_empty());
        assert!(config.deprecations().is_empty());
    }

    #[test]
    fn test_bundled_defaults_only() {
        let temp = TempDir::new().unwrap();
        let config = isolated(&temp)
            .with_search_paths(vec![SearchPath::Bundled])
            .load()
            .unwrap();
        assert_eq!(config.get_str("log_level"), Some("info"));
        assert_eq!(config.get_int("postgresql.port", 0), 5432);
        // env://POSTGRES_PASSWORD is unset in the isolated environment
        assert_eq!(config.get_str("postgresql.password"), Some(""));
    }

    #[test]
    fn test_overrides_apply_after_environment_in_call_order() {
        let temp = TempDir::new().unwrap();
        let config = isolated(&temp)
            .with_env(Environment::from_vars([("STRATA_LOG_LEVEL", "warning")]))
            .with_override("log_level", "error")
            .with_override("postgresql", json!({"host": "a", "port": 1}))
            .with_override("postgresql", json!({"host": "b"}))
            .load()
            .unwrap();
        assert_eq!(config.get_str("log_level"), Some("error"));
        assert_eq!(config.get("postgresql"), Some(json!({"host": "b", "port": 1})));
    }

    #[test]
    fn test_overrides_are_migrated_too() {
        let temp = TempDir::new().unwrap();
        let config = isolated(&temp)
            .with_override("geoip", "/data/city.mmdb")
            .load()
            .unwrap();
        assert_eq!(
            config.get_str("events.context_processors.geoip"),
            Some("/data/city.mmdb")
        );
        assert!(config.get("geoip").is_none());
        assert_eq!(config.deprecations().len(), 1);
    }
}
