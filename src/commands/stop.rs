use crate::commands::{lookup, remove_route, stop_servers};
use crate::config as store;
use crate::paths::ZdevHome;
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

/// Stop a feature's servers and route; the worktree stays on disk.
pub fn run(home: &ZdevHome, feature: &str, project: Option<&Path>, keep: bool) -> Result<()> {
    let mut config = store::load(home)?;

    let Some((name, allocation)) = lookup(&config, feature, project) else {
        bail!("Feature \"{feature}\" not found\n\nRun 'zdev list' to see active features");
    };
    let allocation = allocation.clone();

    println!("{} {}", "Stopping feature:".bold(), feature);
    println!("  Project: {}", allocation.project);

    stop_servers(&allocation);
    remove_route(&config, &allocation);

    config.allocations.remove(&name);
    store::save(home, &config)?;
    tracing::info!(worktree = %name, "feature stopped");

    let worktree = home.worktree_path(&name);
    if keep {
        println!("\n{} Feature \"{feature}\" stopped (worktree kept)", "✓".green());
        println!("  Worktree: {}", worktree.display());
        println!("\n  To remove worktree: zdev clean {feature}");
    } else {
        println!("\n{} Feature \"{feature}\" stopped", "✓".green());
        println!("\n  Worktree still exists at: {}", worktree.display());
        println!(
            "  To remove: zdev clean {feature} --project {}",
            allocation.project_path.display()
        );
    }

    Ok(())
}
