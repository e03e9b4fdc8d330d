// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::Value;

/// A single tool invocation requested by the coordinator.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque identifier supplied by the coordinator, forwarded verbatim.
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments, already validated by the outer transport.
    pub args: Value,
}

/// The result of executing a tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub call_id: String,
    /// Plain-text content returned to the coordinator.
    pub content: String,
    /// If true, the tool execution failed non-fatally (structured refusal
    /// or reference error); the coordinator still receives a completed
    /// response, never a transport-level exception.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn err(call_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: msg.into(),
            is_error: true,
        }
    }

    /// Serializes `value` as pretty JSON for the content field; falls back
    /// to an error output if `value` somehow cannot be serialized.
    pub fn json(call_id: impl Into<String>, value: &impl serde::Serialize) -> Self {
        let call_id = call_id.into();
        match serde_json::to_string(value) {
            Ok(text) => Self::ok(call_id, text),
            Err(e) => Self::err(call_id, format!("failed to encode tool result: {e}")),
        }
    }
}

/// Trait every job-manager operation implements. Deliberately minimal —
/// this layer carries no approval policy or mode gating, since every
/// operation here is always available to the coordinator.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;
    /// Execute the tool. Errors are wrapped in [`ToolOutput::err`]; this
    /// method itself never returns a `Result` because every tool call must
    /// produce a completed response for the coordinator.
    async fn execute(&self, call: &ToolCall) -> ToolOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({ "type": "object" })
        }
        async fn execute(&self, call: &ToolCall) -> ToolOutput {
            ToolOutput::ok(&call.id, call.args.to_string())
        }
    }

    #[tokio::test]
    async fn echo_tool_round_trips_args() {
        let call = ToolCall {
            id: "1".into(),
            name: "echo".into(),
            args: serde_json::json!({"a": 1}),
        };
        let out = EchoTool.execute(&call).await;
        assert!(!out.is_error);
        assert_eq!(out.content, r#"{"a":1}"#);
    }

    #[test]
    fn ok_output_is_not_error() {
        let out = ToolOutput::ok("1", "fine");
        assert!(!out.is_error);
        assert_eq!(out.content, "fine");
    }

    #[test]
    fn err_output_is_error() {
        let out = ToolOutput::err("1", "bad");
        assert!(out.is_error);
        assert_eq!(out.content, "bad");
    }

    #[test]
    fn json_output_serializes_value() {
        let out = ToolOutput::json("1", &serde_json::json!({"ok": true}));
        assert!(!out.is_error);
        assert_eq!(out.content, r#"{"ok":true}"#);
    }
}
