//! strata-config library
//!
//! Layered configuration resolution with provenance. Build a
//! [`config::Config`] once at startup with [`config::ConfigLoader`] and pass
//! it to whatever needs it.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ConfigLoader};
pub use error::{ConfigError, ConfigResult};
