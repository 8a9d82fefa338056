use crate::commands::{lookup, project_key, remove_route, stop_servers};
use crate::config::{self as store, worktree_name};
use crate::git;
use crate::paths::ZdevHome;
use crate::safety::WorktreeGuard;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Remove a feature's worktree after its PR merged, stopping anything left.
pub fn run(home: &ZdevHome, feature: &str, project: Option<&Path>, force: bool) -> Result<()> {
    let mut config = store::load(home)?;

    let found = lookup(&config, feature, project).map(|(name, alloc)| (name, alloc.clone()));

    let (name, allocation) = match (found, project) {
        (Some((name, allocation)), _) => (name, Some(allocation)),
        // explicit project: clean the worktree even without an allocation
        (None, Some(project)) => (worktree_name(&project_key(project), feature), None),
        (None, None) => {
            let active: Vec<&String> = config.allocations.keys().collect();
            let mut message = format!("Feature \"{feature}\" not found in active allocations");
            if !active.is_empty() {
                message.push_str("\n\nActive features:");
                for name in active {
                    message.push_str(&format!("\n  - {name}"));
                }
            }
            bail!(message);
        }
    };

    let worktree = home.worktree_path(&name);
    println!("{} {}", "Cleaning feature:".bold(), feature);

    let mut project_path: Option<PathBuf> = project.and_then(|p| git::absolute(p).ok());
    if let Some(allocation) = &allocation {
        stop_servers(allocation);
        remove_route(&config, allocation);
        project_path = Some(allocation.project_path.clone());
    }

    if worktree.exists() {
        println!("\nRemoving worktree...");
        remove_worktree(home, &worktree, project_path.as_deref(), force)?;
        println!("  {} Worktree removed", "✓".green());
    } else {
        println!("\n  {} Worktree already removed", "⊙".yellow());
    }

    if config.allocations.remove(&name).is_some() {
        store::save(home, &config)?;
    }
    tracing::info!(worktree = %name, "feature cleaned");

    println!("\n{} Feature \"{feature}\" cleaned up", "✓".green());
    Ok(())
}

fn remove_worktree(
    home: &ZdevHome,
    worktree: &Path,
    project_path: Option<&Path>,
    force: bool,
) -> Result<()> {
    let repo = project_path.filter(|path| git::is_git_repo(path));

    match (repo, force) {
        (Some(repo), _) => match git::remove_worktree(repo, worktree) {
            Ok(()) => Ok(()),
            Err(err) if force => {
                println!("  {} {err:#}, force removing directory...", "⊙".yellow());
                force_remove(home, worktree)
            }
            Err(err) => Err(err.context("Use --force to force remove")),
        },
        (None, true) => force_remove(home, worktree),
        (None, false) => bail!(
            "Cannot remove worktree: project path unknown\n  Use --force to force remove, or specify --project"
        ),
    }
}

fn force_remove(home: &ZdevHome, worktree: &Path) -> Result<()> {
    let guard = WorktreeGuard::new(home.worktrees_dir())
        .context("failed to resolve worktrees directory")?;
    guard
        .remove_dir(worktree)
        .with_context(|| format!("failed to remove {}", worktree.display()))?;
    Ok(())
}
