use crate::commands::seed::PROJECT_FILE;
use crate::commands::Project;
use crate::edit::atomic_write;
use crate::git;
use crate::paths::ZdevHome;
use crate::process::{best_error_line, run_capture};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const GITIGNORE_ENTRY: &str = ".zdev/";

#[derive(Debug, Serialize)]
struct ProjectFile<'a> {
    name: &'a str,
    path: &'a Path,
    initialized: DateTime<Utc>,
}

/// Append `.zdev/` to an existing `.gitignore` that doesn't mention it.
///
/// Returns true when the file was changed.
pub fn ignore_zdev_dir(project: &Path) -> Result<bool> {
    let gitignore = project.join(".gitignore");
    let content = match fs::read_to_string(&gitignore) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", gitignore.display()))
        }
    };
    if content.contains(".zdev") {
        return Ok(false);
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(GITIGNORE_ENTRY);
    updated.push('\n');
    atomic_write(&gitignore, updated.as_bytes())?;
    Ok(true)
}

fn write_project_file(project: &Project) -> Result<PathBuf> {
    let marker = project.path.join(PROJECT_FILE);
    if let Some(dir) = marker.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let file = ProjectFile {
        name: &project.name,
        path: &project.path,
        initialized: Utc::now(),
    };
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    atomic_write(&marker, json.as_bytes())?;
    Ok(marker)
}

fn export_seed(home: &ZdevHome, project: &Project) -> Result<()> {
    if !project.path.join("convex").is_dir() {
        println!("  {} No convex/ directory found, skipping seed", "⊘".cyan());
        return Ok(());
    }
    home.ensure_dirs()
        .with_context(|| format!("failed to create {}", home.seeds_dir().display()))?;
    let seed_path = home.seed_path(&project.name);
    let seed = git::path_to_str(&seed_path)?;
    let output = run_capture("bunx", &["convex", "export", "--path", seed], Some(&project.path))?;
    if output.success() {
        println!("  {} Seed saved to: {}", "✓".green(), seed_path.display());
    } else {
        eprintln!(
            "  {} Failed to create seed: {}",
            "✗".red(),
            best_error_line(&output.stderr)
        );
    }
    Ok(())
}

/// Mark a main checkout as managed by zdev.
pub fn run(home: &ZdevHome, path: &Path, seed: bool) -> Result<()> {
    let project = Project::open(path)?;
    println!("{} {}", "Initializing zdev for:".bold(), project.name);

    let marker = write_project_file(&project)?;
    println!("  Created {}", marker.display());

    if ignore_zdev_dir(&project.path)? {
        println!("  Added {GITIGNORE_ENTRY} to .gitignore");
    }

    if seed {
        println!("\nCreating seed data...");
        export_seed(home, &project)?;
    }

    println!("\n{} zdev initialized for {}", "✓".green(), project.name);
    println!("\nNext steps:");
    println!("  zdev start <feature-name>   Start working on a feature");
    println!("  zdev list                   List active worktrees");
    Ok(())
}
