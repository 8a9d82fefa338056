use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

pub fn run_capture(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CmdOutput> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    tracing::debug!(program, ?args, ?cwd, "running command");
    let output = command
        .output()
        .with_context(|| format!("failed to run `{program}`"))?;

    Ok(CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Start a long-running dev server detached from this process.
///
/// stdout and stderr are appended to `log_file`. Returns the child's PID; the
/// child is not waited on.
pub fn spawn_background(
    program: &str,
    args: &[&str],
    cwd: &Path,
    log_file: &Path,
) -> Result<u32> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let log = File::options()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;
    let log_err = log
        .try_clone()
        .context("failed to duplicate log file handle")?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    // Own process group: a Ctrl-C in the invoking shell must not reach it
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command
        .spawn()
        .with_context(|| format!("failed to start `{program}`"))?;
    let pid = child.id();
    tracing::debug!(program, pid, log = %log_file.display(), "started background process");
    Ok(pid)
}

/// Send SIGTERM. Returns false if the signal could not be delivered.
pub fn kill_process(pid: u32) -> bool {
    let pid = pid.to_string();
    run_capture("kill", &["-TERM", &pid], None)
        .map(|output| output.success())
        .unwrap_or(false)
}

pub fn is_process_running(pid: u32) -> bool {
    let pid = pid.to_string();
    run_capture("kill", &["-0", &pid], None)
        .map(|output| output.success())
        .unwrap_or(false)
}

pub fn best_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if let Some(line) = lines
        .iter()
        .find(|line| line.to_ascii_lowercase().starts_with("error:"))
    {
        return (*line).to_string();
    }

    lines
        .last()
        .map(|line| (*line).to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}
