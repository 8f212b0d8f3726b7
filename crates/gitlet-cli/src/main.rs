//! gitlet CLI — the command dispatcher.
//!
//! Every diagnostic is a single line on stdout and the process exits 0
//! unless the failure is structural, so the dispatcher is a plain argv
//! match rather than a declarative parser: the `checkout` forms are
//! distinguished by a positional `--` operand that option parsers eat
//! as their escape token.

use std::env;
use std::path::Path;
use std::process;

use gitlet_core::merge::MergeOutcome;
use gitlet_core::status::{StatusReport, UnstagedKind};
use gitlet_core::{GitletError, GitletResult, Repository};

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("cannot determine working directory: {e}");
            process::exit(1);
        }
    };
    process::exit(run(&args, &cwd));
}

/// Route stderr diagnostics through `tracing`, gated by `GITLET_LOG`.
/// Stdout stays reserved for command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GITLET_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &[String], cwd: &Path) -> i32 {
    let Some(command) = args.first() else {
        println!("Please enter a command.");
        return 0;
    };

    if command != "init" && !cwd.join(".gitlet").exists() {
        println!("{}", GitletError::NotInitialized);
        return 0;
    }

    match dispatch(command, &args[1..], cwd) {
        Ok(()) => 0,
        Err(e) => {
            println!("{e}");
            e.exit_code()
        }
    }
}

fn dispatch(command: &str, operands: &[String], cwd: &Path) -> GitletResult<()> {
    match command {
        "init" => match operands {
            [] => Repository::init(cwd).map(|_| ()),
            _ => Err(GitletError::IncorrectOperands),
        },
        "add" => match operands {
            [file] => Repository::open(cwd)?.add(file),
            _ => Err(GitletError::IncorrectOperands),
        },
        "commit" => match operands {
            [message] => Repository::open(cwd)?.commit(message).map(|_| ()),
            _ => Err(GitletError::IncorrectOperands),
        },
        "rm" => match operands {
            [file] => Repository::open(cwd)?.rm(file),
            _ => Err(GitletError::IncorrectOperands),
        },
        "log" => match operands {
            [] => {
                for commit in Repository::open(cwd)?.log()? {
                    println!("{commit}\n");
                }
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        "global-log" => match operands {
            [] => {
                for commit in Repository::open(cwd)?.global_log()? {
                    println!("{commit}\n");
                }
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        "find" => match operands {
            [message] => {
                let ids = Repository::open(cwd)?.find(message)?;
                if ids.is_empty() {
                    println!("Found no commit with that message.");
                } else {
                    for id in ids {
                        println!("{id}");
                    }
                }
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        "status" => match operands {
            [] => {
                print_status(&Repository::open(cwd)?.status()?);
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        "branch" => match operands {
            [name] => Repository::open(cwd)?.branch(name),
            _ => Err(GitletError::IncorrectOperands),
        },
        "rm-branch" => match operands {
            [name] => Repository::open(cwd)?.rm_branch(name),
            _ => Err(GitletError::IncorrectOperands),
        },
        "checkout" => {
            let mut repo = Repository::open(cwd)?;
            match operands {
                [dashes, file] if dashes == "--" => repo.checkout_file(file),
                [commit_id, dashes, file] if dashes == "--" => {
                    repo.checkout_file_at(commit_id, file)
                }
                [branch] => repo.checkout_branch(branch),
                _ => Err(GitletError::IncorrectOperands),
            }
        }
        "reset" => match operands {
            [commit_id] => Repository::open(cwd)?.reset(commit_id),
            _ => Err(GitletError::IncorrectOperands),
        },
        "merge" => match operands {
            [branch] => {
                match Repository::open(cwd)?.merge(branch)? {
                    MergeOutcome::AlreadyAncestor => {
                        println!("Given branch is an ancestor of the current branch.");
                    }
                    MergeOutcome::FastForwarded => {
                        println!("Current branch fast-forwarded.");
                    }
                    MergeOutcome::Merged { conflict: true } => {
                        println!("Encountered a merge conflict.");
                    }
                    MergeOutcome::Merged { conflict: false } => {}
                }
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        "split" => match operands {
            [id1, id2] => {
                let commit = Repository::open(cwd)?.split(id1, id2)?;
                println!("{commit}\n");
                Ok(())
            }
            _ => Err(GitletError::IncorrectOperands),
        },
        _ => {
            println!("No command with that name exists.");
            Ok(())
        }
    }
}

fn print_status(report: &StatusReport) {
    println!("=== Branches ===");
    println!("*{}", report.current_branch);
    for branch in &report.other_branches {
        println!("{branch}");
    }
    println!();

    println!("=== Staged Files ===");
    for name in &report.staged {
        println!("{name}");
    }
    println!();

    println!("=== Removed Files ===");
    for name in &report.removed {
        println!("{name}");
    }
    println!();

    println!("=== Modifications Not Staged For Commit ===");
    for entry in &report.unstaged {
        match entry.kind {
            UnstagedKind::Modified => println!("{} (modified)", entry.name),
            UnstagedKind::Deleted => println!("{} (deleted)", entry.name),
        }
    }
    println!();

    println!("=== Untracked Files ===");
    for name in &report.untracked {
        println!("{name}");
    }
}
