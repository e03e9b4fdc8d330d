// SPDX-License-Identifier: Apache-2.0
//!
//! [`AgentBridgeMcpServer`] — the rmcp [`ServerHandler`] implementation.
//!
//! Wraps a [`ToolRegistry`] and implements the MCP `tools/list` and
//! `tools/call` protocol methods. All other MCP lifecycle methods
//! (initialize, shutdown, ping) are handled by the default rmcp
//! implementations.
//!
//! The server is stateless at the protocol layer: every `call_tool` request
//! is dispatched to the registry in isolation. State that spans calls (job
//! records, running children) lives in the `JobManager` the registry's
//! tools hold a handle to, not in this struct.
//!
//! # Error mapping
//!
//! A request naming a tool the registry has never heard of is a *protocol*
//! error (the coordinator mistyped a tool name, or asked for an operation
//! this server doesn't expose) and is rejected at the JSON-RPC layer with
//! `invalid_params`, before the registry is even consulted — the same
//! distinction a job-manager-shaped MCP server draws between "no such job"
//! (protocol error) and "job exists but is still running" (a normal,
//! successful result). A tool that *is* found always runs and reports its
//! outcome — including job-manager refusals like "unknown job" or "job
//! already finished" — as ordinary `CallToolResult` content with `isError`
//! set, because those are domain outcomes the coordinator is expected to
//! branch on, not transport failures.

use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    ErrorData as McpError,
};
use uuid::Uuid;

use agentbridge_tools::{ToolCall, ToolRegistry};

use crate::bridge::{output_to_call_result, schema_to_mcp_tool};

/// Wraps a [`ToolRegistry`] and speaks the MCP protocol.
///
/// Create with [`AgentBridgeMcpServer::new`] and then call
/// [`rmcp::ServiceExt::serve`] to start serving on a transport.
#[derive(Clone)]
pub struct AgentBridgeMcpServer {
    registry: Arc<ToolRegistry>,
}

impl AgentBridgeMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The protocol-independent half of `call_tool`: rejects an unknown
    /// tool name as `invalid_params` before touching the registry, then
    /// runs the named tool and bridges its `ToolOutput` to a
    /// [`CallToolResult`]. Split out of the [`ServerHandler::call_tool`]
    /// trait method so it can be exercised directly in tests without
    /// constructing a `RequestContext`.
    async fn dispatch(&self, name: &str, args: serde_json::Value) -> Result<CallToolResult, McpError> {
        if self.registry.get(name).is_none() {
            return Err(McpError::invalid_params(format!("unknown tool: {name}"), None));
        }

        let call = ToolCall {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            args,
        };

        let output = self.registry.execute(&call).await;
        Ok(output_to_call_result(output))
    }
}

impl ServerHandler for AgentBridgeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..ServerInfo::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let registry = self.registry.clone();
        async move {
            let tools = registry.schemas().into_iter().map(schema_to_mcp_tool).collect();
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request
            .arguments
            .map(|m| serde_json::Value::Object(m.into_iter().collect()))
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        self.dispatch(&request.name, args).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use agentbridge_core::JobManager;
    use agentbridge_tools::{SpawnTool, StatusTool, ToolRegistry};

    use super::*;

    fn make_server_with(tools: impl FnOnce(&mut ToolRegistry)) -> AgentBridgeMcpServer {
        let mut reg = ToolRegistry::new();
        tools(&mut reg);
        AgentBridgeMcpServer::new(Arc::new(reg))
    }

    fn job_manager_backed_server(agent_command: &str) -> AgentBridgeMcpServer {
        let manager = Arc::new(JobManager::new(agent_command));
        make_server_with(|reg| {
            reg.register(SpawnTool::new(manager.clone()));
            reg.register(StatusTool::new(manager));
        })
    }

    #[test]
    fn get_info_enables_tools_capability() {
        let server = make_server_with(|_| {});
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some(), "tools capability must be enabled");
    }

    #[test]
    fn get_info_has_no_resources_capability_by_default() {
        let server = make_server_with(|_| {});
        let info = server.get_info();
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn server_is_cloneable() {
        let server = make_server_with(|_| {});
        let _clone = server.clone();
    }

    /// An unknown tool name is a protocol error (`invalid_params`), not a
    /// successful call carrying `isError:true` content — the coordinator
    /// should be able to tell "you asked for something that doesn't exist"
    /// apart from "the job manager refused your request".
    #[tokio::test]
    async fn dispatch_unknown_tool_is_a_protocol_level_error() {
        let server = make_server_with(|_| {});
        let err = server
            .dispatch("does_not_exist", json!({}))
            .await
            .expect_err("unknown tool must be rejected before reaching the registry");
        assert!(err.to_string().contains("does_not_exist"), "error must name the unknown tool: {err}");
    }

    /// Spawning through a real `JobManager` and then asking for status
    /// round-trips an actual job id end to end through `dispatch`, not a
    /// registry fixture standing in for job-manager behaviour.
    #[tokio::test]
    async fn dispatch_spawn_then_status_round_trips_a_real_job() {
        let server = job_manager_backed_server("true");

        let spawn_result = server
            .dispatch("spawn", json!({ "prompt": "say hi" }))
            .await
            .expect("spawn must not be a protocol error");
        assert_eq!(spawn_result.is_error, Some(false));
        let job_id = extract_job_id(&spawn_result);

        let status_result = server
            .dispatch("status", json!({ "jobId": job_id }))
            .await
            .expect("status must not be a protocol error");
        assert_eq!(status_result.is_error, Some(false), "status for a real job must succeed");
    }

    /// A job-manager refusal (status on an id that was never spawned)
    /// surfaces as ordinary `CallToolResult` content with `isError`, not a
    /// JSON-RPC-level error — this is a domain outcome, not a protocol
    /// failure, and the coordinator is expected to branch on it.
    #[tokio::test]
    async fn dispatch_status_unknown_job_id_is_tool_level_error() {
        let server = job_manager_backed_server("true");

        let result = server
            .dispatch("status", json!({ "jobId": "never-spawned" }))
            .await
            .expect("an unknown job id is a tool-level refusal, not a protocol error");
        assert_eq!(result.is_error, Some(true));
    }

    /// Extracts `jobId` from a spawn result by round-tripping it through
    /// JSON, the same way a real MCP client sees it over the wire, rather
    /// than matching on `rmcp`'s internal `Content` representation.
    fn extract_job_id(result: &CallToolResult) -> String {
        let wire = serde_json::to_value(result).expect("CallToolResult must serialize");
        let text = wire["content"][0]["text"].as_str().expect("expected text content");
        let parsed: Value = serde_json::from_str(text).expect("spawn result must be JSON");
        parsed["jobId"].as_str().expect("spawn result must include jobId").to_string()
    }
}
