// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::{EffectiveOverrides, InterruptCoordinator, InterruptRequest, JobManager};

use crate::ops::common::{reasoning_effort_field, sandbox_field, str_field, u64_field, usize_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct InterruptTool {
    coordinator: InterruptCoordinator,
}

impl InterruptTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self {
            coordinator: InterruptCoordinator::new(manager),
        }
    }
}

fn parse_overrides(args: &Value) -> Result<Option<EffectiveOverrides>, String> {
    let Some(overrides) = args.get("overrides") else {
        return Ok(None);
    };
    if overrides.is_null() {
        return Ok(None);
    }
    Ok(Some(EffectiveOverrides {
        model: str_field(overrides, "model"),
        reasoning_effort: reasoning_effort_field(overrides, "reasoningEffort")?,
        sandbox: sandbox_field(overrides, "sandbox")?,
        full_auto: overrides.get("fullAuto").and_then(Value::as_bool),
        working_directory: str_field(overrides, "workingDirectory"),
    }))
}

#[async_trait]
impl Tool for InterruptTool {
    fn name(&self) -> &str {
        "interrupt"
    }

    fn description(&self) -> &str {
        "Cancels a running subagent job and respawns it with a new prompt that carries forward a \
         bounded tail of the prior job's events, optionally overriding its model, sandbox, or other \
         options. Refuses if the job already finished on its own."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string" },
                "newPrompt": { "type": "string" },
                "waitMs": { "type": "integer", "minimum": 0 },
                "includeEventTail": { "type": "boolean", "default": true },
                "tailMaxEvents": { "type": "integer", "minimum": 0 },
                "overrides": {
                    "type": "object",
                    "properties": {
                        "model": { "type": "string" },
                        "reasoningEffort": { "type": "string", "enum": ["low", "medium", "high"] },
                        "sandbox": { "type": "string", "enum": ["read-only", "workspace-write", "danger-full-access"] },
                        "fullAuto": { "type": "boolean" },
                        "workingDirectory": { "type": "string" }
                    },
                    "additionalProperties": false
                }
            },
            "required": ["jobId", "newPrompt"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(job_id) = str_field(&call.args, "jobId") else {
            return ToolOutput::err(&call.id, "missing required field: jobId");
        };
        let Some(new_prompt) = str_field(&call.args, "newPrompt") else {
            return ToolOutput::err(&call.id, "missing required field: newPrompt");
        };
        let overrides = match parse_overrides(&call.args) {
            Ok(o) => o,
            Err(e) => return ToolOutput::err(&call.id, e),
        };

        let include_event_tail = call.args.get("includeEventTail").and_then(Value::as_bool);
        let req = InterruptRequest {
            job_id,
            new_prompt,
            wait_ms: u64_field(&call.args, "waitMs"),
            include_event_tail,
            tail_max_events: usize_field(&call.args, "tailMaxEvents"),
            overrides,
        };

        match self.coordinator.interrupt(req).await {
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
        ToolCall { id: "1".into(), name: "interrupt".into(), args }
    }

    #[tokio::test]
    async fn missing_new_prompt_is_a_tool_error() {
        let tool = InterruptTool::new(Arc::new(JobManager::new("true")));
        let out = tool.execute(&call(json!({"jobId": "x"}))).await;
        assert!(out.is_error);
        assert!(out.content.contains("newPrompt"));
    }

    #[tokio::test]
    async fn unknown_job_id_is_a_tool_error() {
        let tool = InterruptTool::new(Arc::new(JobManager::new("true")));
        let out = tool
            .execute(&call(json!({"jobId": "nope", "newPrompt": "p"})))
            .await;
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn invalid_override_sandbox_is_a_tool_error() {
        let tool = InterruptTool::new(Arc::new(JobManager::new("true")));
        let out = tool
            .execute(&call(json!({
                "jobId": "x",
                "newPrompt": "p",
                "overrides": { "sandbox": "bogus" }
            })))
            .await;
        assert!(out.is_error);
    }
}
