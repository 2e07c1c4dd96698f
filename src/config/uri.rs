//! Value indirection through `env://` and `file://` URIs.
//!
//! - `env://NAME?fallback` reads the environment variable `NAME`
//! - `file:///path/to/secret?fallback` reads and trims the file contents
//!
//! Anything else is a literal. The fallback is the query component and is
//! used when the variable is unset or the file cannot be read.

use super::attr::{Attr, Source};
use super::env::Environment;
use std::borrow::Cow;
use tracing::error;
use url::Url;

/// Resolves string values into [`Attr`]s, following URI indirections.
#[derive(Debug, Clone, Default)]
pub struct UriResolver {
    env: Environment,
}

impl UriResolver {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Resolve `raw` into a cell.
    ///
    /// The cell always records `raw` as a URI source, literal or not, so it can
    /// be re-resolved later.
    pub fn resolve(&self, raw: &str) -> Attr {
        let resolved = match Url::parse(raw) {
            Ok(url) if url.scheme() == "env" => self.resolve_env(&url),
            Ok(url) if url.scheme() == "file" => self.resolve_file(&url),
            _ => raw.to_string(),
        };
        Attr::with_source(resolved, Source::Uri(raw.to_string()))
    }

    fn resolve_env(&self, url: &Url) -> String {
        let name = url.host_str().map(decode).unwrap_or_default();
        self.env
            .var(&name)
            .unwrap_or_else(|| query_fallback(url))
    }

    fn resolve_file(&self, url: &Url) -> String {
        let path = decode(url.path());
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read config value from file");
                query_fallback(url)
            }
        }
    }
}

fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

fn query_fallback(url: &Url) -> String {
    url.query().map(|q| decode(q).into_owned()).unwrap_or_default()
}
