//! CLI definition for strata-config.
//!
//! With no arguments the whole resolved tree is printed as JSON; with a dotted
//! path only that value is printed.

use crate::config::{Config, ConfigLoader, Node};
use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::path::PathBuf;

/// Print the resolved configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dotted path of a single value to print (whole tree when omitted)
    pub path: Option<String>,

    /// Environment name used to pick `<env>.yml` files (overrides STRATA_ENV)
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Directory searched for `<env>.yml` files (default: current directory)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Print where the value came from instead of the value itself
    #[arg(long, requires = "path")]
    pub source: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}

impl Cli {
    /// Loader configured from the command line flags.
    pub fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(environment) = &self.environment {
            loader = loader.with_environment(environment);
        }
        if let Some(base_dir) = &self.base_dir {
            loader = loader.with_base_dir(base_dir);
        }
        loader
    }

    /// Render what should be printed for these arguments.
    pub fn render(&self, config: &Config) -> Result<String> {
        let Some(path) = &self.path else {
            return render_tree(config);
        };
        let Some(node) = config.node(path) else {
            bail!("'{}' is not set", path);
        };
        if self.source {
            Ok(render_source(node))
        } else {
            render_value(&node.to_value())
        }
    }
}

/// The whole tree as JSON indented by four spaces, without provenance.
pub fn render_tree(config: &Config) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    config.raw().serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Strings print bare, everything else as JSON.
pub fn render_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) | Value::Array(_) => {
            let mut buf = Vec::new();
            let mut ser =
                serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
            value.serialize(&mut ser)?;
            Ok(String::from_utf8(buf)?)
        }
        other => Ok(other.to_string()),
    }
}

/// Origin kind and detail of a node, e.g. `uri env://POSTGRES_PASSWORD`.
pub fn render_source(node: &Node) -> String {
    match node {
        Node::Table(_) => "table".to_string(),
        Node::Leaf(attr) => match attr.source_detail() {
            Some(detail) => format!("{} {}", attr.source_kind(), detail),
            None => attr.source_kind().to_string(),
        },
    }
}
