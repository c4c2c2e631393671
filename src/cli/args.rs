//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--json`: Print results as JSON
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// quire - branch, merge and sync for writers
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if quire was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, list branches
    #[command(subcommand)]
    Branch(BranchAction),

    /// Switch to a local branch, or detach at a remote branch
    #[command(
        long_about = "Switch to a branch.\n\n\
            A local branch is checked out and HEAD follows it. If no local branch \
            matches, remote-tracking branches are tried (`origin/<name>` for a bare \
            name) and HEAD is left detached at the remote branch's commit.\n\n\
            Uncommitted changes that would be overwritten stop the switch and \
            nothing is modified.",
        after_help = "\
EXAMPLES:
    quire switch chapter-3
    quire switch origin/review      # detached at the remote branch"
    )]
    Switch {
        /// Branch name
        name: String,
    },

    /// Merge a branch into the current one
    #[command(
        long_about = "Merge a branch into the current branch.\n\n\
            Fast-forwards when possible; otherwise creates a merge commit. On \
            conflict the merge is left in progress: fix the listed files, run \
            `quire resolve <path>` for each, then commit, or run `quire abort`."
    )]
    Merge {
        /// Branch to merge
        branch: String,
    },

    /// Fetch, integrate and push the current branch
    #[command(
        long_about = "Synchronize a branch with its remote.\n\n\
            Fetches from the remote, integrates the remote branch (fast-forward or \
            merge), then pushes if the local branch is ahead. Conflicts stop the \
            sync before anything is pushed.",
        after_help = "\
EXAMPLES:
    quire sync
    quire sync --remote backup --branch drafts
    quire sync --no-push"
    )]
    Sync {
        /// Remote to sync with (default: config, then `origin`)
        #[arg(long)]
        remote: Option<String>,

        /// Branch to sync (default: current branch)
        #[arg(long)]
        branch: Option<String>,

        /// Integrate only; don't push
        #[arg(long)]
        no_push: bool,
    },

    /// Stage files for the next commit
    Stage {
        /// Paths relative to the repository root
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Mark a conflicting file as resolved
    Resolve {
        /// Path relative to the repository root
        path: String,
    },

    /// Abort an in-progress merge, discarding its changes
    Abort,

    /// Show the current branch and any operation in progress
    Status,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands.
#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// Create a branch at HEAD and switch to it
    Create {
        /// New branch name
        name: String,
    },
    /// List local branches
    List,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "quire", "--json", "sync", "--remote", "backup", "--no-push",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Sync {
                remote,
                branch,
                no_push,
            } => {
                assert_eq!(remote.as_deref(), Some("backup"));
                assert!(branch.is_none());
                assert!(no_push);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_branch_create() {
        let cli = Cli::try_parse_from(["quire", "branch", "create", "ch-2"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Branch(BranchAction::Create { name }) if name == "ch-2"
        ));
    }

    #[test]
    fn stage_requires_paths() {
        assert!(Cli::try_parse_from(["quire", "stage"]).is_err());
    }
}
