//! zdev: multi-agent worktree development environments
//!
//! Each feature gets its own git worktree under the zdev home, its own
//! frontend (and optional Convex) dev server on allocated ports, and an
//! optional public route through Traefik.
//!
//! # Architecture
//!
//! Rewrites of user files compile down to a single primitive: [`TextEdit`],
//! a byte-span replacement applied in memory. The vite patcher locates spans
//! with regex anchors, decides whether a rewrite is needed at all, and writes
//! the file back at most once through [`edit::atomic_write`].
//!
//! # Safety
//!
//! - Rewrites are idempotent: a second run reports a skip and writes nothing
//! - Atomic file writes (tempfile + fsync + rename)
//! - Forced directory removal is confined to the worktrees directory
//! - Config state is read and written explicitly through [`ZdevHome`]
//!
//! # Example
//!
//! ```no_run
//! use zdev::vite::{patch_vite_config, PatchOptions};
//!
//! let options = PatchOptions::new()
//!     .dev_domain("dev.example.com")
//!     .server_port(5174)
//!     .devtools_port(42174);
//!
//! let result = patch_vite_config("web/vite.config.ts", &options);
//! println!("{result}");
//! ```

pub mod commands;
pub mod config;
pub mod edit;
pub mod git;
pub mod paths;
pub mod process;
pub mod proxy;
pub mod safety;
pub mod vite;

// Re-exports
pub use config::{
    PortAllocation, StoreError, WorktreeAllocation, ZdevConfig, DEVTOOLS_PORT_OFFSET,
};
pub use edit::{atomic_write, EditError, TextEdit};
pub use paths::{ZdevHome, ZDEV_HOME_ENV};
pub use safety::{SafetyError, WorktreeGuard};
#[allow(deprecated)]
pub use vite::patch_vite_allowed_hosts;
pub use vite::{
    find_vite_config, patch_source, patch_vite_config, AllowedHostsResult, PatchOptions,
    PatchOutcome, PatchResult,
};
