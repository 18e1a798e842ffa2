//! Command-line interface for skypixel
//!
//! This module implements the CLI commands that drive the snapshot store outside of the
//! web server: loading the snapshots on demand, keeping them refreshed, and managing the
//! configuration file.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **snapshot**: Build the store, load the requested resources once, and print them
//!   as JSON
//! - **watch**: Warm the store up, schedule background refreshes, and run until Ctrl-C
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and values
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Commands that talk to the upstream share
//! [`CommonArgs`](common::CommonArgs), which sets up logging, loads the configuration and
//! builds the [`CacheStore`](crate::snapshots::CacheStore).

mod common;
mod config;
mod host;
mod init;
mod run;
mod snapshot;
mod validate;
mod watch;

pub use common::{CommonArgs, LogLevel};
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use snapshot::{Resource, SnapshotArgs, print_snapshot};
pub use validate::{ValidateArgs, validate_config};
pub use watch::{WatchArgs, watch};
