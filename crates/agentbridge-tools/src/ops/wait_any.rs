// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::{clamp_ms, u64_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

const DEFAULT_TIMEOUT_MS: u64 = 0;
const MAX_TIMEOUT_MS: u64 = 300_000;

pub struct WaitAnyTool {
    manager: Arc<JobManager>,
}

impl WaitAnyTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

fn parse_job_ids(args: &Value) -> Result<Vec<String>, String> {
    let arr = args
        .get("jobIds")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing required field: jobIds".to_string())?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| "jobIds must be an array of strings".to_string())
        })
        .collect()
}

#[async_trait]
impl Tool for WaitAnyTool {
    fn name(&self) -> &str {
        "wait_any"
    }

    fn description(&self) -> &str {
        "Blocks until any one of the given jobs reaches a terminal state, or until timeoutMs elapses. \
         A timeoutMs of 0 polls the current state without waiting."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobIds": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                "timeoutMs": { "type": "integer", "minimum": 0, "maximum": MAX_TIMEOUT_MS, "default": DEFAULT_TIMEOUT_MS }
            },
            "required": ["jobIds"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let job_ids = match parse_job_ids(&call.args) {
            Ok(ids) => ids,
            Err(e) => return ToolOutput::err(&call.id, e),
        };
        let timeout_ms = clamp_ms(u64_field(&call.args, "timeoutMs"), DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS);
        let outcome = self.manager.wait_any(&job_ids, timeout_ms).await;
        ToolOutput::json(&call.id, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "1".into(), name: "wait_any".into(), args }
    }

    #[tokio::test]
    async fn missing_job_ids_is_a_tool_error() {
        let tool = WaitAnyTool::new(Arc::new(JobManager::new("true")));
        let out = tool.execute(&call(json!({}))).await;
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn unknown_job_ids_are_reported_as_missing_not_errors() {
        let tool = WaitAnyTool::new(Arc::new(JobManager::new("true")));
        let out = tool.execute(&call(json!({"jobIds": ["nope"]}))).await;
        assert!(!out.is_error);
        assert!(out.content.contains("nope"));
    }
}
