use crate::commands::display_diff;
use crate::config as store;
use crate::paths::ZdevHome;
use crate::vite::{find_vite_config, patch_source, patch_vite_config, PatchOptions};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct PatchArgs {
    /// Falls back to the configured devDomain
    pub domain: Option<String>,
    pub port: Option<u16>,
    pub devtools_port: Option<u16>,
    pub dry_run: bool,
    pub diff: bool,
}

/// A directory argument means "the vite config inside it".
fn resolve_target(target: &Path) -> Result<PathBuf> {
    if target.is_dir() {
        return find_vite_config(target)
            .with_context(|| format!("No vite config found in {}", target.display()));
    }
    if !target.is_file() {
        bail!("File not found: {}", target.display());
    }
    Ok(target.to_path_buf())
}

fn print_actions(actions: &[String]) {
    for action in actions {
        println!("  {} {action}", "•".dimmed());
    }
}

pub fn run(home: &ZdevHome, target: &Path, args: &PatchArgs) -> Result<()> {
    let file = resolve_target(target)?;

    let mut options = PatchOptions::new();
    match &args.domain {
        Some(domain) => options = options.dev_domain(domain),
        None => {
            let config = store::load(home)?;
            if let Some(domain) = config.domain() {
                options = options.dev_domain(domain);
            }
        }
    }
    if let Some(port) = args.port {
        options = options.server_port(port);
    }
    if let Some(port) = args.devtools_port {
        options = options.devtools_port(port);
    }

    println!("{} {}", "Patching".bold(), file.display());

    if args.dry_run || args.diff {
        let original = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let outcome = patch_source(&original, &options);
        if args.diff && outcome.content != original {
            display_diff(&file, &original, &outcome.content);
        }
        if args.dry_run {
            print_actions(&outcome.actions);
            let verdict = if outcome.content == original {
                "no changes"
            } else {
                "would change"
            };
            println!("\n{} Dry run: {verdict}", "⊙".yellow());
            return Ok(());
        }
    }

    let result = patch_vite_config(&file, &options);
    print_actions(&result.actions);
    if result.patched {
        println!("\n{} Patched {}", "✓".green(), file.display());
    } else {
        println!("\n{} Unchanged", "⊘".cyan());
    }
    Ok(())
}
