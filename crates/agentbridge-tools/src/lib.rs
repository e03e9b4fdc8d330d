// SPDX-License-Identifier: MIT
pub mod ops;
pub mod registry;
pub mod tool;

pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{Tool, ToolCall, ToolOutput};

pub use ops::{
    CancelTool, EventsTool, GetSpawnMetadataTool, InterruptTool, ResultTool, RunTool, SpawnGroupTool,
    SpawnTool, StatusTool, WaitAnyTool,
};

/// Builds the default registry with every job-manager operation registered
/// under the names the coordinator calls them by.
pub fn build_default_registry(manager: std::sync::Arc<agentbridge_core::JobManager>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SpawnTool::new(manager.clone()));
    registry.register(SpawnGroupTool::new(manager.clone()));
    registry.register(StatusTool::new(manager.clone()));
    registry.register(ResultTool::new(manager.clone()));
    registry.register(EventsTool::new(manager.clone()));
    registry.register(CancelTool::new(manager.clone()));
    registry.register(WaitAnyTool::new(manager.clone()));
    registry.register(InterruptTool::new(manager.clone()));
    registry.register(GetSpawnMetadataTool::new(manager.clone()));
    registry.register(RunTool::new(manager));
    registry
}
