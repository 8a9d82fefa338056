//! `zdev` subcommands.
//!
//! Every command takes the resolved [`ZdevHome`] explicitly and returns
//! `anyhow::Result`; user-facing progress goes to stdout/stderr, diagnostics
//! go through `tracing`.

pub mod clean;
pub mod config;
pub mod init;
pub mod list;
pub mod patch;
pub mod seed;
pub mod start;
pub mod stop;

use crate::config::{WorktreeAllocation, ZdevConfig};
use crate::git;
use crate::paths::ZdevHome;
use crate::process::{is_process_running, kill_process};
use crate::proxy;
use anyhow::{bail, Result};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};

/// A validated main checkout.
#[derive(Debug, Clone)]
pub struct Project {
    pub path: PathBuf,
    pub name: String,
}

impl Project {
    /// Resolve `path` and require it to be a git checkout.
    pub fn open(path: &Path) -> Result<Self> {
        let path = git::absolute(path)?;
        if !git::is_git_repo(&path) {
            bail!("Not a git repository: {}", path.display());
        }
        let name = git::repo_name(&path);
        Ok(Self { path, name })
    }
}

/// Repo name used to look up allocations for `--project`.
///
/// A path that is not a git checkout is taken as the repo name itself.
pub(crate) fn project_key(project: &Path) -> String {
    match git::absolute(project) {
        Ok(path) if git::is_git_repo(&path) => git::repo_name(&path),
        _ => project.display().to_string(),
    }
}

/// Find an allocation, optionally scoped to one project.
pub(crate) fn lookup<'a>(
    config: &'a ZdevConfig,
    feature: &str,
    project: Option<&Path>,
) -> Option<(String, &'a WorktreeAllocation)> {
    let repo = project.map(project_key);
    config
        .find_allocation(feature, repo.as_deref())
        .map(|(name, alloc)| (name.to_string(), alloc))
}

/// Which dev server a PID belongs to, for messages.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Server {
    Frontend,
    Convex,
}

impl Server {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Server::Frontend => "frontend",
            Server::Convex => "Convex",
        }
    }

    pub(crate) fn log_name(self) -> &'static str {
        match self {
            Server::Frontend => "frontend",
            Server::Convex => "convex",
        }
    }
}

/// Terminate whichever of the allocation's servers are still alive.
pub(crate) fn stop_servers(allocation: &WorktreeAllocation) {
    let servers = [
        (Server::Frontend, allocation.pids.frontend),
        (Server::Convex, allocation.pids.convex),
    ];

    for (server, pid) in servers {
        let Some(pid) = pid.filter(|pid| is_process_running(*pid)) else {
            continue;
        };
        println!("Stopping {} (PID: {pid})...", server.label());
        if kill_process(pid) {
            println!("  {} {} stopped", "✓".green(), server.label());
        } else {
            eprintln!("  {} Failed to stop {}", "✗".red(), server.label());
        }
    }
}

/// Remove the allocation's Traefik route, if it had one.
pub(crate) fn remove_route(config: &ZdevConfig, allocation: &WorktreeAllocation) {
    let Some(route) = allocation.route() else {
        return;
    };
    println!("Removing Traefik route...");
    match proxy::remove_route(&config.traefik_config_dir, route) {
        Ok(()) => println!("  {} Route removed", "✓".green()),
        Err(err) => eprintln!("  {} {err:#}", "✗".red()),
    }
}

pub(crate) fn separator(width: usize) -> String {
    "─".repeat(width)
}

/// Show unified diff between original and modified content
pub(crate) fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

pub(crate) fn home_summary(home: &ZdevHome) {
    println!("Home:      {}", home.root().display());
    println!("Worktrees: {}", home.worktrees_dir().display());
}
