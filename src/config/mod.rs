//! Layered configuration.
//!
//! Merges configuration from several layers into one tree, later layers
//! overriding earlier ones leaf by leaf:
//! 1. **Bundled defaults** - `config/default.yml`, embedded at build time
//! 2. **System file** - `/etc/strata/config.yml`
//! 3. **Environment file** - `<env>.yml` (and variants) in the base directory
//! 4. **Drop-ins** - `/etc/strata/config.d/*.yml`, sorted
//! 5. **Environment variables** - `STRATA_*`
//!
//! ## Environment Variables
//! - `STRATA_ENV` - Environment name for step 3 (default: `local`)
//! - `STRATA_POSTGRESQL__HOST` - Sets `postgresql.host`; values are parsed as
//!   JSON when possible
//!
//! ## Value Indirection
//! Any string value may point elsewhere:
//! - `env://NAME?fallback` - read another environment variable
//! - `file:///path?fallback` - read (and trim) a file, e.g. a mounted secret
//!
//! Every leaf remembers its [`Source`], so URI values can be re-read with
//! [`Config::refresh`].

mod attr;
mod deprecations;
mod env;
mod files;
mod loader;
mod merge;
mod path;
mod tree;
mod uri;

pub use attr::{Attr, Node, Source, SourceKind, Tree, tree_to_value};
pub use deprecations::{DEPRECATIONS, Deprecation, migrate_deprecations};
pub use env::{DEFAULT_ENV_PREFIX, Environment, env_key_to_path, ingest, parse_env_value};
pub use files::{
    BUNDLED_DEFAULTS, ENV_FILE_SUFFIXES, SYSTEM_CONFIG_FILE, SYSTEM_DROP_IN_PATTERN, SearchPath,
    default_search_paths, drop_in_files, environment_candidates, expand_search_path, load_file,
    parse_document,
};
pub use loader::{ConfigLoader, DEFAULT_ENVIRONMENT};
pub use merge::{Incoming, merge};
pub use path::{DEFAULT_SEP, get_path, get_path_mut, pop_path, set_path};
pub use tree::{Config, PatchGuard};
pub use uri::UriResolver;
