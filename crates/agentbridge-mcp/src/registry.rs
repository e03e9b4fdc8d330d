// SPDX-License-Identifier: MIT
//!
//! Default MCP tool registry for the agentbridge MCP server.
//!
//! Unlike a filesystem- or shell-tool registry, every operation here is
//! always safe to expose: there is no live-session or P2P-only tool to
//! exclude. `build_mcp_registry` is a thin wrapper over
//! [`agentbridge_tools::build_default_registry`] so the MCP crate has a
//! single, obvious place the `serve` command calls into.

use std::sync::Arc;

use agentbridge_core::JobManager;
use agentbridge_tools::ToolRegistry;

/// Builds a [`ToolRegistry`] populated with every subagent job-manager
/// operation, backed by `manager`.
pub fn build_mcp_registry(manager: Arc<JobManager>) -> ToolRegistry {
    agentbridge_tools::build_default_registry(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_contains_every_operation() {
        let manager = Arc::new(JobManager::new("true"));
        let reg = build_mcp_registry(manager);
        let names = reg.names();
        for expected in [
            "spawn",
            "spawn_group",
            "status",
            "result",
            "events",
            "cancel",
            "wait_any",
            "interrupt",
            "get_spawn_metadata",
            "run",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing tool {expected:?} in {names:?}");
        }
    }
}
