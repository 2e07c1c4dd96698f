//! Configuration file discovery and YAML loading.
//!
//! The search path list is walked in order and later entries override earlier
//! ones. File entries are loaded directly. Directory entries are expanded into
//! environment-named candidates (`<env>.yml`, `<env>.env.yml`, ...).

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Defaults compiled into the binary; always the first layer.
pub const BUNDLED_DEFAULTS: &str = include_str!("../../config/default.yml");

/// Name used for the bundled defaults in logs and errors.
pub const BUNDLED_ORIGIN: &str = "<bundled default.yml>";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/strata/config.yml";

/// Drop-in configuration files, loaded last in sorted order.
pub const SYSTEM_DROP_IN_PATTERN: &str = "/etc/strata/config.d/*.yml";

/// File name suffixes tried, in order, inside a directory search path.
pub const ENV_FILE_SUFFIXES: [&str; 4] = [".yml", ".env.yml", ".yaml", ".env.yaml"];

/// One entry of the search path list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath {
    /// The defaults embedded at build time.
    Bundled,
    /// A file or directory on disk. Relative paths are joined onto the
    /// loader's base directory; the empty path means the base directory
    /// itself.
    Path(PathBuf),
}

impl SearchPath {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SearchPath::Path(path.into())
    }
}

/// The standard search path list.
///
/// Bundled defaults, then the system file, then the base directory in
/// directory mode, then every drop-in file.
pub fn default_search_paths() -> Vec<SearchPath> {
    let mut paths = vec![
        SearchPath::Bundled,
        SearchPath::path(SYSTEM_CONFIG_FILE),
        SearchPath::path(""),
    ];
    paths.extend(drop_in_files(SYSTEM_DROP_IN_PATTERN).into_iter().map(SearchPath::Path));
    paths
}

/// Files matching a glob pattern, in sorted order.
pub fn drop_in_files(pattern: &str) -> Vec<PathBuf> {
    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid config drop-in pattern");
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable config drop-in");
                None
            }
        })
        .collect();
    files.sort();
    files
}

/// Candidate file names for `environment` inside `dir`, in load order.
pub fn environment_candidates(dir: &Path, environment: &str) -> Vec<PathBuf> {
    ENV_FILE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{environment}{suffix}")))
        .collect()
}

/// Expand a path entry into the files that should be loaded from it.
///
/// Missing entries expand to nothing.
pub fn expand_search_path(path: &Path, base_dir: &Path, environment: &str) -> Vec<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    if path.is_file() {
        vec![path]
    } else if path.is_dir() {
        environment_candidates(&path, environment)
            .into_iter()
            .filter(|candidate| candidate.is_file())
            .collect()
    } else {
        debug!(path = %path.display(), "Config search path not found");
        Vec::new()
    }
}

/// Parse a YAML document into a top-level mapping.
///
/// An empty document is an empty mapping. Anything that is not a mapping, or
/// not YAML at all, means the process is improperly configured.
pub fn parse_document(contents: &str, origin: &str) -> ConfigResult<Map<String, Value>> {
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_yaml::from_str(contents).map_err(|source| ConfigError::ImproperlyConfigured {
            origin: origin.to_string(),
            source,
        })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::NotAMapping {
            origin: origin.to_string(),
        }),
    }
}

/// Read and parse a YAML config file.
///
/// Returns `Ok(None)` when the file is skipped (permission denied, or gone
/// since discovery).
pub fn load_file(path: &Path) -> ConfigResult<Option<Map<String, Value>>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => return skip_unreadable(path, e),
    };
    let map = parse_document(&contents, &path.display().to_string())?;
    debug!(path = %path.display(), "Loaded config");
    Ok(Some(map))
}

fn skip_unreadable(path: &Path, error: std::io::Error) -> ConfigResult<Option<Map<String, Value>>> {
    match error.kind() {
        ErrorKind::PermissionDenied => {
            warn!(path = %path.display(), error = %error, "Permission denied while reading file");
            Ok(None)
        }
        ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file disappeared before it could be read");
            Ok(None)
        }
        _ => Err(ConfigError::io(path, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_defaults_parse() {
        let map = parse_document(BUNDLED_DEFAULTS, BUNDLED_ORIGIN).unwrap();
        assert_eq!(map.get("log_level"), Some(&json!("info")));
        assert_eq!(map["postgresql"]["port"], json!(5432));
    }

    #[test]
    fn test_parse_document_rejects_bad_yaml() {
        let err = parse_document("log_level: [info", "broken.yml").unwrap_err();
        assert!(matches!(err, ConfigError::ImproperlyConfigured { .. }));
    }

    #[test]
    fn test_parse_document_rejects_non_mapping() {
        let err = parse_document("- a\n- b\n", "list.yml").unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { .. }));
        assert!(err.is_improperly_configured());
    }

    #[test]
    fn test_parse_document_empty() {
        assert!(parse_document("", "empty.yml").unwrap().is_empty());
        assert!(parse_document("\n   \n", "blank.yml").unwrap().is_empty());
    }

    #[test]
    fn test_environment_candidates_order() {
        let candidates = environment_candidates(Path::new("/srv/strata"), "production");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/strata/production.yml"),
                PathBuf::from("/srv/strata/production.env.yml"),
                PathBuf::from("/srv/strata/production.yaml"),
                PathBuf::from("/srv/strata/production.env.yaml"),
            ]
        );
    }

    #[test]
    fn test_expand_directory_keeps_existing_candidates() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("local.env.yaml"), "a: 1").unwrap();
        std::fs::write(temp.path().join("local.yml"), "a: 2").unwrap();
        std::fs::write(temp.path().join("production.yml"), "a: 3").unwrap();

        let files = expand_search_path(Path::new(""), temp.path(), "local");
        assert_eq!(
            files,
            vec![temp.path().join("local.yml"), temp.path().join("local.env.yaml")]
        );
    }

    #[test]
    fn test_expand_file_and_missing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.yml"), "a: 1").unwrap();

        let files = expand_search_path(Path::new("config.yml"), temp.path(), "local");
        assert_eq!(files, vec![temp.path().join("config.yml")]);

        let absolute = temp.path().join("config.yml");
        assert_eq!(
            expand_search_path(&absolute, Path::new("/nonexistent"), "local"),
            vec![absolute.clone()]
        );

        assert!(expand_search_path(Path::new("missing.yml"), temp.path(), "local").is_empty());
    }

    #[test]
    fn test_load_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "postgresql:\n  host: db\n").unwrap();

        let map = load_file(&path).unwrap().unwrap();
        assert_eq!(Value::Object(map), json!({"postgresql": {"host": "db"}}));
    }

    #[test]
    fn test_load_file_malformed_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "postgresql: {host: db\n").unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(err.is_improperly_configured());
    }

    #[test]
    fn test_permission_denied_is_skipped() {
        let path = Path::new("/etc/strata/config.yml");
        let denied = std::io::Error::new(ErrorKind::PermissionDenied, "denied");
        assert!(skip_unreadable(path, denied).unwrap().is_none());

        let gone = std::io::Error::new(ErrorKind::NotFound, "gone");
        assert!(skip_unreadable(path, gone).unwrap().is_none());

        let other = std::io::Error::new(ErrorKind::InvalidData, "not utf-8");
        assert!(matches!(
            skip_unreadable(path, other),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_drop_in_files_sorted() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("config.d");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("20-late.yml"), "a: 2").unwrap();
        std::fs::write(dir.join("10-early.yml"), "a: 1").unwrap();
        std::fs::write(dir.join("ignored.yaml"), "a: 3").unwrap();

        let pattern = format!("{}/*.yml", dir.display());
        assert_eq!(
            drop_in_files(&pattern),
            vec![dir.join("10-early.yml"), dir.join("20-late.yml")]
        );
    }
}
