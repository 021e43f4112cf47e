//! Configuration of the hacluster hook runner
//!
//! Options come from the command line, from the environment the Juju agent
//! sets up for a hook, and optionally from a TOML config file whose entries
//! are overridden by explicit command line flags

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

pub mod cli;
pub mod parsing;

pub use cli::{AdapterConfig, Cli, Command};
pub use parsing::{parse_command_line_args, parse_config_from_args};
