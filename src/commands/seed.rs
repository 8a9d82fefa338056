use crate::commands::Project;
use crate::git;
use crate::paths::ZdevHome;
use crate::process::{best_error_line, run_capture};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Location of the per-project marker written by `zdev init`.
pub const PROJECT_FILE: &str = ".zdev/project.json";

#[derive(Debug, Deserialize)]
struct ProjectFile {
    name: String,
}

/// Project name for seed lookup: `.zdev/project.json` first, then git.
pub fn project_name(path: &Path) -> Result<String> {
    let marker = path.join(PROJECT_FILE);
    if let Ok(raw) = fs::read_to_string(&marker) {
        match serde_json::from_str::<ProjectFile>(&raw) {
            Ok(project) if !project.name.is_empty() => return Ok(project.name),
            Ok(_) => {}
            Err(err) => tracing::warn!(path = %marker.display(), %err, "ignoring malformed project file"),
        }
    }
    if git::is_git_repo(path) {
        return Ok(git::repo_name(path));
    }
    bail!("Cannot determine project name for {}", path.display())
}

/// Export Convex data from the main checkout into the seed store.
pub fn export(home: &ZdevHome, path: &Path) -> Result<()> {
    let project = Project::open(path)?;
    let seed_path = home.seed_path(&project.name);

    println!("{} {}", "Exporting seed data for:".bold(), project.name);
    home.ensure_dirs()
        .with_context(|| format!("failed to create {}", home.seeds_dir().display()))?;

    let seed = git::path_to_str(&seed_path)?;
    let output = run_capture("bunx", &["convex", "export", "--path", seed], Some(&project.path))?;
    if !output.success() {
        bail!("Failed to export seed: {}", best_error_line(&output.stderr));
    }

    println!("\n{} Seed exported to: {}", "✓".green(), seed_path.display());
    Ok(())
}

/// Replace a checkout's Convex data with the project's seed.
pub fn import(home: &ZdevHome, path: &Path) -> Result<()> {
    let path = git::absolute(path)?;
    let name = project_name(&path)?;
    let seed_path = home.seed_path(&name);

    if !seed_path.is_file() {
        bail!(
            "No seed found for {name}\n  Expected: {}\n\n  Create one with: zdev seed export <main-repo-path>",
            seed_path.display()
        );
    }

    println!("{} {}", "Importing seed data for:".bold(), name);
    println!("  From: {}", seed_path.display());

    let seed = git::path_to_str(&seed_path)?;
    let output = run_capture("bunx", &["convex", "import", "--replace", seed], Some(&path))?;
    if !output.success() {
        bail!("Failed to import seed: {}", best_error_line(&output.stderr));
    }

    println!("\n{} Seed imported successfully", "✓".green());
    Ok(())
}
