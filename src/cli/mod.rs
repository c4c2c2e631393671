//! cli
//!
//! Command-line interface layer for quire.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to [`crate::engine`] operations
//! - Render their results (plain lines or JSON)
//!
//! The CLI never touches the repository itself.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::ui::output::{self, Verbosity};

/// Per-invocation settings shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory to discover the repository from
    pub cwd: PathBuf,
    /// Print results as JSON
    pub json: bool,
    pub verbosity: Verbosity,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = match &cli.cwd {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        Ok(Self {
            cwd,
            json: cli.json,
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        })
    }

    /// Show a result: JSON when requested, else the human line.
    pub fn report<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            output::json(value).context("failed to serialize result")?;
        } else {
            output::print(human(), self.verbosity);
        }
        Ok(())
    }
}

/// Run the CLI application with already-parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli)?;
    commands::dispatch(cli.command, &ctx)
}
