//! strata-config
//!
//! Prints the resolved configuration: the whole tree as JSON, or a single
//! value when given a dotted path.

use anyhow::Result;
use clap::Parser;
use strata_config::cli::Cli;
use strata_config::logging::{self, LogOutput};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogOutput::parse(&cli.log), cli.verbose)?;

    let config = cli.loader().load()?;
    for deprecation in config.deprecations() {
        debug!(deprecated = %deprecation.old, replacement = %deprecation.new, "Migrated deprecated key");
    }

    println!("{}", cli.render(&config)?);
    Ok(())
}
