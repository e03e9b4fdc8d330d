// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::parse_spawn_request;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct SpawnTool {
    manager: Arc<JobManager>,
}

impl SpawnTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SpawnTool {
    fn name(&self) -> &str {
        "spawn"
    }

    fn description(&self) -> &str {
        "Starts an asynchronous subagent job running the coding agent on the given prompt. \
         Returns immediately with a jobId; poll with status/events/result."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "The instructions given to the subagent." },
                "model": { "type": "string" },
                "reasoningEffort": { "type": "string", "enum": ["low", "medium", "high"] },
                "sandbox": { "type": "string", "enum": ["read-only", "workspace-write", "danger-full-access"] },
                "fullAuto": { "type": "boolean" },
                "workingDirectory": { "type": "string" },
                "label": { "type": "string", "description": "Coordinator-supplied tag, echoed back but never interpreted." }
            },
            "required": ["prompt"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let req = match parse_spawn_request(&call.args) {
            Ok(req) => req,
            Err(e) => return ToolOutput::err(&call.id, e),
        };

        match self.manager.spawn_from_request(req).await {
            Ok(outcome) => ToolOutput::json(&call.id, &outcome),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(args: Value) -> ToolCall {
        ToolCall {
            id: "1".into(),
            name: "spawn".into(),
            args,
        }
    }

    #[tokio::test]
    async fn missing_prompt_is_a_tool_error_not_a_panic() {
        let tool = SpawnTool::new(Arc::new(JobManager::new("nonexistent-agent-binary")));
        let out = tool.execute(&call(json!({}))).await;
        assert!(out.is_error);
        assert!(out.content.contains("prompt"));
    }

    #[tokio::test]
    async fn invalid_sandbox_is_a_tool_error() {
        let tool = SpawnTool::new(Arc::new(JobManager::new("nonexistent-agent-binary")));
        let out = tool
            .execute(&call(json!({"prompt": "hi", "sandbox": "not-real"})))
            .await;
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn spawn_with_missing_binary_still_returns_a_job_id() {
        // Command::spawn() failing (ENOENT) is handled inside the core as a
        // dead-on-arrival job, not surfaced as a tool error.
        let tool = SpawnTool::new(Arc::new(JobManager::new("definitely-not-a-real-binary-xyz")));
        let out = tool.execute(&call(json!({"prompt": "hi"}))).await;
        assert!(!out.is_error);
        assert!(out.content.contains("jobId"));
    }
}
