// SPDX-License-Identifier: Apache-2.0
//!
//! End-to-end integration tests for the agentbridge MCP server.
//!
//! Each test drives a real [`AgentBridgeMcpServer`] over in-memory pipes,
//! sending raw JSON-RPC 2.0 messages and validating the responses. This
//! exercises the full rmcp dispatch path and confirms the tool-registry ↔
//! MCP bridge behaves correctly from a client's perspective.
//!
//! The helpers here use raw JSON instead of an rmcp client so tests are
//! independent of the rmcp client API and directly verify the wire format
//! real MCP hosts will see.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::ServiceExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, WriteHalf};

use agentbridge_core::JobManager;
use agentbridge_mcp::AgentBridgeMcpServer;
use agentbridge_tools::{Tool, ToolCall, ToolOutput, ToolRegistry};

// ── Test tool fixtures ──────────────────────────────────────────────────────

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes the message argument back to the caller"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        })
    }
    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let msg = call.args.get("message").and_then(Value::as_str).unwrap_or("no message");
        ToolOutput::ok(&call.id, msg)
    }
}

struct AlwaysFailTool;

#[async_trait]
impl Tool for AlwaysFailTool {
    fn name(&self) -> &str {
        "always_fail"
    }
    fn description(&self) -> &str {
        "Always returns an error"
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        ToolOutput::err(&call.id, "this tool always fails")
    }
}

// ── In-process MCP server harness ──────────────────────────────────────────

async fn start_test_server(
    registry: Arc<ToolRegistry>,
) -> (WriteHalf<DuplexStream>, BufReader<tokio::io::ReadHalf<DuplexStream>>) {
    let (client_stream, server_stream) = tokio::io::duplex(65536);

    tokio::spawn(async move {
        let server = AgentBridgeMcpServer::new(registry);
        if let Ok(running) = server.serve(server_stream).await {
            let _ = running.waiting().await;
        }
    });

    let (client_read, client_write) = tokio::io::split(client_stream);
    let reader = BufReader::new(client_read);
    (client_write, reader)
}

async fn send_msg(writer: &mut WriteHalf<DuplexStream>, msg: &Value) {
    let line = serde_json::to_string(msg).expect("message must serialize");
    writer.write_all(line.as_bytes()).await.expect("write failed");
    writer.write_all(b"\n").await.expect("newline write failed");
    writer.flush().await.expect("flush failed");
}

async fn recv_msg(reader: &mut BufReader<tokio::io::ReadHalf<DuplexStream>>) -> Value {
    let mut line = String::new();
    tokio::time::timeout(std::time::Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("timed out waiting for server response")
        .expect("read error");
    serde_json::from_str(line.trim()).expect("server response must be valid JSON")
}

async fn initialize(
    writer: &mut WriteHalf<DuplexStream>,
    reader: &mut BufReader<tokio::io::ReadHalf<DuplexStream>>,
) -> Value {
    send_msg(
        writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "agentbridge-test-client", "version": "0.0.0" }
            }
        }),
    )
    .await;

    let init_resp = recv_msg(reader).await;
    assert_eq!(init_resp["jsonrpc"], "2.0", "initialize response must be JSON-RPC 2.0");
    assert!(init_resp["result"].is_object(), "initialize must return a result object");

    send_msg(writer, &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await;

    init_resp["result"].clone()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_declares_tools_capability() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    let result = initialize(&mut writer, &mut reader).await;
    assert!(result["capabilities"]["tools"].is_object(), "server must advertise tools capability; got: {result}");
}

#[tokio::test]
async fn tools_list_returns_registered_tools() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(&mut writer, &json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {} })).await;

    let resp = recv_msg(&mut reader).await;
    let tools = resp["result"]["tools"].as_array().expect("tools must be an array");
    assert_eq!(tools.len(), 1, "expected exactly 1 tool");
    assert_eq!(tools[0]["name"], "echo");
    assert_eq!(tools[0]["description"], "Echoes the message argument back to the caller");
}

#[tokio::test]
async fn tools_list_empty_registry() {
    let reg = Arc::new(ToolRegistry::new());
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(&mut writer, &json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {} })).await;

    let resp = recv_msg(&mut reader).await;
    let tools = resp["result"]["tools"].as_array().expect("tools must be an array");
    assert!(tools.is_empty(), "expected no tools in empty registry");
}

#[tokio::test]
async fn tools_list_includes_input_schema() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(&mut writer, &json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {} })).await;

    let resp = recv_msg(&mut reader).await;
    let tools = &resp["result"]["tools"];
    let schema = &tools[0]["inputSchema"];
    assert_eq!(schema["type"], "object", "inputSchema must have type:object");
    assert!(schema["properties"]["message"].is_object(), "schema must include message property");
}

#[tokio::test]
async fn tools_call_success_returns_content() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "echo", "arguments": { "message": "hello from test" } }
        }),
    )
    .await;

    let resp = recv_msg(&mut reader).await;
    assert!(resp["result"].is_object(), "call must return a result; got: {resp}");
    assert_eq!(resp["result"]["isError"], false);

    let content = resp["result"]["content"].as_array().expect("content must be an array");
    assert!(!content.is_empty(), "content must not be empty");
    assert_eq!(content[0]["text"], "hello from test");
}

#[tokio::test]
async fn tools_call_error_tool_sets_is_error() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(AlwaysFailTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "always_fail", "arguments": {} }
        }),
    )
    .await;

    let resp = recv_msg(&mut reader).await;
    assert_eq!(resp["result"]["isError"], true, "always_fail must set isError:true; got {resp}");

    let content = resp["result"]["content"].as_array().expect("content must be an array");
    assert!(!content.is_empty());
    assert!(
        content[0]["text"].as_str().unwrap_or("").contains("always fails"),
        "error message must be forwarded"
    );
}

/// Calling a tool name the registry has never heard of is a JSON-RPC-level
/// `invalid_params` error, not a successful call carrying `isError:true`
/// content — see `server.rs`'s "Error mapping" doc comment.
#[tokio::test]
async fn tools_call_unknown_tool_returns_an_rpc_level_error() {
    let reg = Arc::new(ToolRegistry::new());
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "nonexistent", "arguments": {} }
        }),
    )
    .await;

    let resp = recv_msg(&mut reader).await;
    assert!(resp["error"].is_object(), "unknown tool must be a JSON-RPC error, not a result; got: {resp}");
    let message = resp["error"]["message"].as_str().unwrap_or("");
    assert!(message.contains("nonexistent"), "error message must name the unknown tool; got: {message}");
}

#[tokio::test]
async fn tools_call_multiple_tools_independently() {
    let reg = Arc::new({
        let mut r = ToolRegistry::new();
        r.register(EchoTool);
        r.register(AlwaysFailTool);
        r
    });
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(&mut writer, &json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/list", "params": {} })).await;
    let list_resp = recv_msg(&mut reader).await;
    let tools = list_resp["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 2, "both tools must be listed");

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0", "id": 6,
            "method": "tools/call",
            "params": { "name": "echo", "arguments": { "message": "ping" } }
        }),
    )
    .await;
    let echo_resp = recv_msg(&mut reader).await;
    assert_eq!(echo_resp["result"]["isError"], false);

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0", "id": 7,
            "method": "tools/call",
            "params": { "name": "always_fail", "arguments": {} }
        }),
    )
    .await;
    let fail_resp = recv_msg(&mut reader).await;
    assert_eq!(fail_resp["result"]["isError"], true);
}

/// The default registry backed by a real `JobManager` lists every
/// subagent-job operation.
#[tokio::test]
async fn default_registry_tools_are_listed_by_server() {
    let manager = Arc::new(JobManager::new("true"));
    let reg = Arc::new(agentbridge_mcp::build_mcp_registry(manager));
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(&mut writer, &json!({ "jsonrpc": "2.0", "id": 8, "method": "tools/list", "params": {} })).await;

    let resp = recv_msg(&mut reader).await;
    let tools = resp["result"]["tools"].as_array().expect("tools array");
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

    for expected in ["spawn", "status", "result", "events", "cancel", "interrupt"] {
        assert!(names.contains(&expected), "{expected} must be listed; got: {names:?}");
    }
}

/// Calling `spawn` through the full MCP stack with a missing binary still
/// returns a job id rather than a protocol-level error.
#[tokio::test]
async fn spawn_through_mcp_round_trips_a_job_id() {
    let manager = Arc::new(JobManager::new("definitely-not-a-real-binary-xyz"));
    let reg = Arc::new(agentbridge_mcp::build_mcp_registry(manager));
    let (mut writer, mut reader) = start_test_server(reg).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(
        &mut writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/call",
            "params": { "name": "spawn", "arguments": { "prompt": "hello" } }
        }),
    )
    .await;

    let resp = recv_msg(&mut reader).await;
    assert_eq!(resp["result"]["isError"], false);
    let content = resp["result"]["content"].as_array().expect("content array");
    let text = content[0]["text"].as_str().unwrap_or("");
    assert!(text.contains("jobId"), "expected jobId in spawn output; got: {text}");
}
