//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the server's TOML configuration and provides
//! sensible defaults when the file does not exist yet (first run).

pub mod config;
