//! Skein command line
//!
//! Library half of the `skein` binary: argument definitions, configuration
//! loading, logging setup and the subcommands themselves.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command, GenerateArgs, StateArgs};
pub use config::{LoggingConfig, SkeinConfig};
