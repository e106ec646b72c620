//! CLI argument parsing for cmdlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Cmdlock: run a named command at most once at a time across hosts.
///
/// A lock record per command name lives in a directory shared by every
/// participating host. Records left behind by crashed local processes are
/// detected and reclaimed.
#[derive(Parser, Debug)]
#[command(name = "cmdlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML config file (default: /etc/cmdlock.yaml if present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding lock records (overrides the config file).
    #[arg(long, global = true, value_name = "DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Increase log verbosity (-v: info, -vv: debug). `CMDLOCK_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cmdlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding its lock.
    ///
    /// Fails immediately (exit code 4) if another instance holds the lock.
    /// Otherwise exits with the wrapped command's exit code.
    Run(RunArgs),

    /// Report whether a command's lock is currently held.
    ///
    /// Exits 0 when the lock is free, 4 when it is held. Never modifies records.
    Check(CheckArgs),

    /// List all lock records with their owner, age and state.
    List,

    /// Remove a command's lock record.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(ClearArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Command name to lock on (e.g., "report:nightly").
    pub name: String,

    /// Program and arguments to run.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM"
    )]
    pub command: Vec<String>,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Command name to check.
    pub name: String,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Command name whose lock record should be removed.
    pub name: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_with_separator() {
        let cli = Cli::try_parse_from([
            "cmdlock",
            "run",
            "report:nightly",
            "--",
            "php",
            "bin/console",
            "--env=prod",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.name, "report:nightly");
            assert_eq!(args.command, vec!["php", "bin/console", "--env=prod"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_without_separator() {
        let cli = Cli::try_parse_from(["cmdlock", "run", "backup", "tar", "-czf", "out.tgz"])
            .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.name, "backup");
            assert_eq!(args.command, vec!["tar", "-czf", "out.tgz"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_program() {
        assert!(Cli::try_parse_from(["cmdlock", "run", "backup"]).is_err());
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::try_parse_from([
            "cmdlock",
            "--config",
            "/etc/other.yaml",
            "--lock-dir",
            "/run/locks",
            "-vv",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/other.yaml")));
        assert_eq!(cli.lock_dir, Some(PathBuf::from("/run/locks")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["cmdlock", "check", "backup"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.name, "backup");
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn parse_clear() {
        let cli = Cli::try_parse_from(["cmdlock", "clear", "backup", "--force"]).unwrap();
        if let Command::Clear(args) = cli.command {
            assert_eq!(args.name, "backup");
            assert!(args.force);
        } else {
            panic!("Expected Clear command");
        }
    }

    #[test]
    fn parse_clear_defaults_to_no_force() {
        let cli = Cli::try_parse_from(["cmdlock", "clear", "backup"]).unwrap();
        if let Command::Clear(args) = cli.command {
            assert!(!args.force);
        } else {
            panic!("Expected Clear command");
        }
    }
}
