#![forbid(unsafe_code)]

//! `dialkit` command-line tool.
//!
//! Loads a JSON panel schema and drives it through the runtime: list leaf
//! paths, describe controls, resolve snapshots with overrides, and fire
//! actions. Log verbosity follows the `DIALKIT_LOG` filter.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{CliError, Result};
