//! Port allocation from the store's counters.

use crate::config::schema::ZdevConfig;

/// Offset from the frontend port to the devtools event bus port
/// (5173 -> 42173), keeping both unique per worktree.
pub const DEVTOOLS_PORT_OFFSET: u16 = 37000;

/// Offset from an explicit `--port` to the Convex port.
pub const EXPLICIT_CONVEX_OFFSET: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAllocation {
    pub frontend: u16,
    pub convex: Option<u16>,
    pub devtools: Option<u16>,
}

/// Devtools port paired with a frontend port, if it fits in u16.
pub fn devtools_port_for(frontend: u16) -> Option<u16> {
    frontend.checked_add(DEVTOOLS_PORT_OFFSET)
}

/// Ports for an explicit `--port`; counters are not touched.
pub fn explicit_ports(frontend: u16, has_convex: bool) -> PortAllocation {
    PortAllocation {
        frontend,
        convex: has_convex
            .then(|| frontend.checked_add(EXPLICIT_CONVEX_OFFSET))
            .flatten(),
        devtools: devtools_port_for(frontend),
    }
}

impl ZdevConfig {
    /// Take the next ports from the counters and advance them.
    ///
    /// The Convex counter only moves for projects that use Convex.
    pub fn allocate_ports(&mut self, has_convex: bool) -> PortAllocation {
        let frontend = self.next_frontend_port;
        self.next_frontend_port = frontend.saturating_add(1);

        let convex = has_convex.then(|| {
            let port = self.next_convex_port;
            self.next_convex_port = port.saturating_add(1);
            port
        });

        PortAllocation {
            frontend,
            convex,
            devtools: devtools_port_for(frontend),
        }
    }
}
