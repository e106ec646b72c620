//! Command implementations for cmdlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each handler returns the process exit code on success.

mod run;

use crate::cli::{CheckArgs, ClearArgs, Cli, Command};
use crate::config::Config;
use crate::error::{CmdLockError, Result};
use crate::exit_codes;
use crate::locks::{self, LockInfo, LockManager, LockRecord, LockState};

/// Dispatch a command to its implementation.
///
/// Resolves the configuration once, then routes to the handler.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let config = Config::resolve(cli.config.as_deref(), cli.lock_dir)?;

    match cli.command {
        Command::Run(args) => run::cmd_run(&config, args),
        Command::Check(args) => cmd_check(&config, args),
        Command::List => cmd_list(&config),
        Command::Clear(args) => cmd_clear(&config, args),
    }
}

fn cmd_check(config: &Config, args: CheckArgs) -> Result<i32> {
    let manager = LockManager::new(config)?;

    if manager.is_excluded(&args.name) {
        println!("'{}' is excluded from locking.", args.name);
        return Ok(exit_codes::SUCCESS);
    }

    match manager.check(&args.name)? {
        Some(info) => Err(CmdLockError::AlreadyRunning {
            command: args.name,
            owner: info.owner,
        }),
        None => {
            println!("'{}' is not running.", args.name);
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn cmd_list(config: &Config) -> Result<i32> {
    let local = LockRecord::current(config)?;
    let locks = locks::list_locks(&config.lock_dir, &local.host)?;

    if locks.is_empty() {
        println!("No locks in {}.", config.lock_dir.display());
        return Ok(exit_codes::SUCCESS);
    }

    println!("Locks in {} ({}):", config.lock_dir.display(), locks.len());
    println!();

    for lock in &locks {
        print_lock_details(lock, "  ");
        println!();
    }

    // Summary
    let reclaimable = locks.iter().filter(|l| !l.state.blocks_acquire()).count();
    if reclaimable > 0 {
        println!(
            "Note: {} lock(s) are stale or malformed and will be reclaimed by the next run on this host.",
            reclaimable
        );
    }
    let foreign = locks
        .iter()
        .filter(|l| l.state == LockState::Foreign)
        .count();
    if foreign > 0 {
        println!(
            "Note: {} lock(s) belong to other hosts. If such a host crashed, use `cmdlock clear <name> --force`.",
            foreign
        );
    }

    Ok(exit_codes::SUCCESS)
}

fn cmd_clear(config: &Config, args: ClearArgs) -> Result<i32> {
    // Require --force flag
    if !args.force {
        return Err(CmdLockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock lets a second instance start while the first may still be running.\n\
             Only clear locks if you are certain the lock holder has died.\n\n\
             To clear the lock, run:\n  cmdlock clear {} --force",
            args.name
        )));
    }

    let local = LockRecord::current(config)?;
    let cleared = locks::clear_lock(&config.lock_dir, &args.name, &local.host)?;

    println!("Cleared lock: {}", cleared.name);
    println!();
    println!("Lock details:");
    print_lock_details(&cleared, "  ");

    Ok(exit_codes::SUCCESS)
}

fn print_lock_details(lock: &LockInfo, indent: &str) {
    println!("{}{}:", indent, lock.name);
    println!("{}  Owner:      {}", indent, lock.owner);
    if let Some(record) = &lock.record {
        println!("{}  Host:       {}", indent, record.host);
        println!("{}  PID:        {}", indent, record.pid);
    }
    if let Some(modified) = lock.modified {
        println!(
            "{}  Created:    {}",
            indent,
            modified.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("{}  Age:        {}", indent, lock.age_string());
    println!("{}  Status:     {}", indent, lock.state);
    println!("{}  Path:       {}", indent, lock.path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TEST_HOST, test_config, write_raw_record};

    #[test]
    fn clear_requires_force() {
        let (_temp_dir, config) = test_config();
        let path = locks::lock_path(&config.lock_dir, "job-a");
        write_raw_record(&path, "other-host:1");

        let err = cmd_clear(
            &config,
            ClearArgs {
                name: "job-a".to_string(),
                force: false,
            },
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("--force"));
        assert!(path.exists());
    }

    #[test]
    fn clear_with_force_removes_record() {
        let (_temp_dir, config) = test_config();
        let path = locks::lock_path(&config.lock_dir, "job-a");
        write_raw_record(&path, "other-host:1");

        let code = cmd_clear(
            &config,
            ClearArgs {
                name: "job-a".to_string(),
                force: true,
            },
        )
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        assert!(!path.exists());
    }

    #[test]
    fn clear_missing_record_is_user_error() {
        let (_temp_dir, config) = test_config();

        let err = cmd_clear(
            &config,
            ClearArgs {
                name: "job-a".to_string(),
                force: true,
            },
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn check_free_lock_succeeds() {
        let (_temp_dir, config) = test_config();

        let code = cmd_check(
            &config,
            CheckArgs {
                name: "job-a".to_string(),
            },
        )
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn check_held_lock_conflicts() {
        let (_temp_dir, config) = test_config();
        write_raw_record(
            &locks::lock_path(&config.lock_dir, "job-a"),
            &format!("{}:1", TEST_HOST),
        );

        let err = cmd_check(
            &config,
            CheckArgs {
                name: "job-a".to_string(),
            },
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::LOCK_CONFLICT);
        assert!(err.to_string().contains("test-host:1"));
    }

    #[test]
    fn check_excluded_command_succeeds() {
        let (_temp_dir, mut config) = test_config();
        config.exclude.insert("job-a".to_string());
        write_raw_record(
            &locks::lock_path(&config.lock_dir, "job-a"),
            "other-host:1",
        );

        let code = cmd_check(
            &config,
            CheckArgs {
                name: "job-a".to_string(),
            },
        )
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn list_handles_missing_dir() {
        let (_temp_dir, config) = test_config();
        assert_eq!(cmd_list(&config).unwrap(), exit_codes::SUCCESS);
    }
}
