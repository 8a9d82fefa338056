//! Vite config patcher - read, rewrite in memory, write back only on change
//!
//! This module is advisory tooling: it never returns an error. Unreadable
//! files, unrecognized shapes and failed writes all come back as action
//! lines inside [`PatchResult`].

use crate::edit::atomic_write;
use crate::vite::rules::{patch_allowed_hosts, patch_devtools_port, patch_server_port, Step};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names tried by [`find_vite_config`], in order.
pub const VITE_CONFIG_NAMES: &[&str] = &[
    "vite.config.ts",
    "vite.config.js",
    "vite.config.mts",
    "vite.config.mjs",
];

/// Settings to apply. Every field is independent; `None` means "not requested".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Domain for `server.allowedHosts` (`dev.example.com` allows `.dev.example.com`)
    pub dev_domain: Option<String>,
    /// Port injected as `server.port`
    pub server_port: Option<u16>,
    /// Port for the devtools plugin's `eventBusConfig`
    pub devtools_port: Option<u16>,
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dev_domain(mut self, domain: impl Into<String>) -> Self {
        self.dev_domain = Some(domain.into());
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    pub fn devtools_port(mut self, port: u16) -> Self {
        self.devtools_port = Some(port);
        self
    }

    /// Port 0 is never written; it counts as not requested.
    fn requested_server_port(&self) -> Option<u16> {
        self.server_port.filter(|port| *port != 0)
    }

    fn requested_devtools_port(&self) -> Option<u16> {
        self.devtools_port.filter(|port| *port != 0)
    }

    fn has_port_settings(&self) -> bool {
        self.requested_server_port().is_some() || self.requested_devtools_port().is_some()
    }
}

/// Result of patching a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult reports whether the file was written"]
pub struct PatchResult {
    /// True only when new content was computed *and* persisted
    pub patched: bool,
    /// One line per setting considered, in application order
    pub actions: Vec<String>,
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.patched { "patched" } else { "unchanged" };
        write!(f, "{state}: {}", self.actions.join("; "))
    }
}

/// In-memory result of [`patch_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub content: String,
    pub actions: Vec<String>,
}

/// Legacy single-setting result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedHostsResult {
    pub patched: bool,
    pub reason: String,
}

fn record(step: Step, content: &mut String, actions: &mut Vec<String>) {
    tracing::debug!(action = %step.action, "vite patch step");
    *content = step.content;
    actions.push(step.action);
}

/// Apply every requested rewrite to `source`, in the fixed order
/// allowedHosts, server.port, devtools. Pure; no I/O.
pub fn patch_source(source: &str, options: &PatchOptions) -> PatchOutcome {
    let mut content = source.to_string();
    let mut actions = Vec::new();

    match options.dev_domain.as_deref().map(str::trim) {
        Some("") if !options.has_port_settings() => {
            actions.push("allowedHosts: no devDomain configured".to_string());
        }
        Some("") | None => {}
        Some(domain) => {
            let step = patch_allowed_hosts(&content, domain);
            record(step, &mut content, &mut actions);
        }
    }

    if let Some(port) = options.requested_server_port() {
        let step = patch_server_port(&content, port);
        record(step, &mut content, &mut actions);
    }

    if let Some(port) = options.requested_devtools_port() {
        let step = patch_devtools_port(&content, port);
        record(step, &mut content, &mut actions);
    }

    if actions.is_empty() {
        actions.push("no changes needed".to_string());
    }

    PatchOutcome { content, actions }
}

/// Patch a vite config file in place.
///
/// The file is read once and written at most once, only when the rewritten
/// text differs from what was read.
///
/// The write goes to a temporary sibling that is then renamed over `path`,
/// so the file gets a new inode. Its permission bits carry over, but any
/// other hard link to the old file keeps the old content.
pub fn patch_vite_config(path: impl AsRef<Path>, options: &PatchOptions) -> PatchResult {
    let path = path.as_ref();

    let original = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), "could not read vite config: {err}");
            return PatchResult {
                patched: false,
                actions: vec!["could not read vite config".to_string()],
            };
        }
    };

    let PatchOutcome {
        content,
        mut actions,
    } = patch_source(&original, options);

    if content == original {
        return PatchResult {
            patched: false,
            actions,
        };
    }

    if let Err(err) = atomic_write(path, content.as_bytes()) {
        tracing::warn!(path = %path.display(), "could not write vite config: {err}");
        actions.push("could not write vite config".to_string());
        return PatchResult {
            patched: false,
            actions,
        };
    }

    tracing::info!(path = %path.display(), "patched vite config");
    PatchResult {
        patched: true,
        actions,
    }
}

/// Allowed-hosts only entry point, kept for older callers.
#[deprecated(note = "use patch_vite_config with PatchOptions::dev_domain")]
pub fn patch_vite_allowed_hosts(path: impl AsRef<Path>, dev_domain: &str) -> AllowedHostsResult {
    let result = patch_vite_config(path, &PatchOptions::new().dev_domain(dev_domain));
    AllowedHostsResult {
        patched: result.patched,
        reason: result.actions.join("; "),
    }
}

/// Locate the vite config inside `dir`.
pub fn find_vite_config(dir: &Path) -> Option<PathBuf> {
    VITE_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
