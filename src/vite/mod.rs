pub mod anchor;
pub mod patcher;
pub mod rules;

pub use anchor::{ensure_server_block, ConfigIdiom, ServerBlock, CONFIG_IDIOMS};
#[allow(deprecated)]
pub use patcher::patch_vite_allowed_hosts;
pub use patcher::{
    find_vite_config, patch_source, patch_vite_config, AllowedHostsResult, PatchOptions,
    PatchOutcome, PatchResult, VITE_CONFIG_NAMES,
};
pub use rules::{patch_allowed_hosts, patch_devtools_port, patch_server_port, Step};
