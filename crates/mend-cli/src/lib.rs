//! Command-line driver for mend
//!
//! Wires configuration ([`config`]) to the library drivers ([`commands`]) and
//! exposes the clap definition ([`cli`]) so it can be tested without a
//! process boundary.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{build_cli, init_tracing, run};
pub use config::{ConfigError, MendConfig};
