pub mod loader;
pub mod ports;
pub mod schema;

pub use loader::{load, save, StoreError};
pub use ports::{
    devtools_port_for, explicit_ports, PortAllocation, DEVTOOLS_PORT_OFFSET, EXPLICIT_CONVEX_OFFSET,
};
pub use schema::{
    feature_branch, worktree_name, ConfigKey, ProcessIds, UnknownConfigKey, WorktreeAllocation,
    ZdevConfig,
};
