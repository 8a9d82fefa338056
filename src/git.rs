use crate::process::{best_error_line, run_capture};
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static REPO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/:]([^/:]+?)(?:\.git)?/?$").expect("valid repo name regex"));

/// True for a checkout root; worktrees carry a `.git` file rather than a dir.
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Repository name from the `origin` URL, falling back to the directory name.
pub fn repo_name(path: &Path) -> String {
    let from_remote = run_capture("git", &["remote", "get-url", "origin"], Some(path))
        .ok()
        .filter(|output| output.success())
        .and_then(|output| parse_repo_name(output.stdout.trim()));

    from_remote.unwrap_or_else(|| directory_name(path))
}

/// Last path segment of a git URL without `.git`.
///
/// Handles `https://host/org/repo.git` and `git@host:org/repo.git`.
pub fn parse_repo_name(url: &str) -> Option<String> {
    REPO_NAME
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty())
}

fn directory_name(path: &Path) -> String {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    absolute
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

pub fn fetch(repo: &Path) -> Result<()> {
    let output = run_capture("git", &["fetch", "origin"], Some(repo))?;
    if !output.success() {
        bail!("git fetch failed: {}", best_error_line(&output.stderr));
    }
    Ok(())
}

pub fn create_worktree(repo: &Path, worktree: &Path, branch: &str, base: &str) -> Result<()> {
    let worktree_str = path_to_str(worktree)?;
    let output = run_capture(
        "git",
        &["worktree", "add", worktree_str, "-b", branch, base],
        Some(repo),
    )
    .context("failed to create git worktree")?;
    if !output.success() {
        bail!(
            "failed to create worktree: {}",
            best_error_line(&output.stderr)
        );
    }
    Ok(())
}

/// `git worktree remove --force`, then prune stale entries.
pub fn remove_worktree(repo: &Path, worktree: &Path) -> Result<()> {
    let worktree_str = path_to_str(worktree)?;
    let output = run_capture(
        "git",
        &["worktree", "remove", worktree_str, "--force"],
        Some(repo),
    )
    .context("failed to remove git worktree")?;
    if !output.success() {
        bail!(
            "failed to remove worktree: {}",
            best_error_line(&output.stderr)
        );
    }

    if let Err(err) = run_capture("git", &["worktree", "prune"], Some(repo)) {
        tracing::debug!("git worktree prune failed: {err:#}");
    }
    Ok(())
}

/// Hide local edits to `file` from `git status` (used for the patched vite config).
pub fn skip_worktree(dir: &Path, file: &str) -> Result<()> {
    let output = run_capture(
        "git",
        &["update-index", "--skip-worktree", file],
        Some(dir),
    )?;
    if !output.success() {
        bail!(
            "git update-index failed: {}",
            best_error_line(&output.stderr)
        );
    }
    Ok(())
}

pub fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

/// Resolve a user-supplied project path to an absolute one.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("path does not exist: {}", path.display()))
}
