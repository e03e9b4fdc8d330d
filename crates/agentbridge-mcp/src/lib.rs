// SPDX-License-Identifier: Apache-2.0
//!
//! `agentbridge-mcp` — MCP (Model Context Protocol) server exposing the
//! subagent job manager over **stdio** transport using line-delimited
//! JSON-RPC.
//!
//! # Architecture
//!
//! ```text
//! AI coordinator
//!       │  stdin/stdout (line-delimited JSON-RPC)
//!       ▼
//! AgentBridgeMcpServer (rmcp ServerHandler)
//!       │
//!       ▼
//! ToolRegistry  ──►  Tool::execute()  ──►  JobManager / InterruptCoordinator
//! ```

pub mod bridge;
pub mod registry;
pub mod server;

pub use registry::build_mcp_registry;
pub use server::AgentBridgeMcpServer;

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use agentbridge_tools::ToolRegistry;

/// Starts an MCP stdio server, serving the tools in `registry` on stdin /
/// stdout. Blocks until the client disconnects (stdin EOF) or the process
/// is terminated.
///
/// # Errors
///
/// Returns an error if the rmcp transport fails to initialize or if the
/// server encounters a fatal I/O error.
pub async fn serve_stdio(registry: Arc<ToolRegistry>) -> Result<()> {
    let server = AgentBridgeMcpServer::new(registry);
    let running = server
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await
        .map_err(|e| anyhow::anyhow!("MCP server init error: {e}"))?;
    running
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
    Ok(())
}
