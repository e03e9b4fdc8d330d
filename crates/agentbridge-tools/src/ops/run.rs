// SPDX-License-Identifier: MIT
//! A minimal synchronous tool composed entirely from the asynchronous
//! primitives: spawn, then block until the job finishes or the timeout
//! elapses, then report its result. Adds no process-handling logic of its
//! own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::{JobManager, ResultOutput, ResultView};

use crate::ops::common::{clamp_ms, parse_spawn_request, u64_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const MAX_TIMEOUT_MS: u64 = 10 * 60_000;

pub struct RunTool {
    manager: Arc<JobManager>,
}

impl RunTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for RunTool {
    fn name(&self) -> &str {
        "run"
    }

    fn description(&self) -> &str {
        "Runs a subagent synchronously: spawns it, waits up to timeoutMs for it to finish, and \
         returns its final message. If the timeout elapses first, the job keeps running in the \
         background and its jobId is returned so the caller can poll it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string" },
                "model": { "type": "string" },
                "reasoningEffort": { "type": "string", "enum": ["low", "medium", "high"] },
                "sandbox": { "type": "string", "enum": ["read-only", "workspace-write", "danger-full-access"] },
                "fullAuto": { "type": "boolean" },
                "workingDirectory": { "type": "string" },
                "label": { "type": "string" },
                "timeoutMs": { "type": "integer", "minimum": 0, "maximum": MAX_TIMEOUT_MS, "default": DEFAULT_TIMEOUT_MS }
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
        let timeout_ms = clamp_ms(u64_field(&call.args, "timeoutMs"), DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS);

        let outcome = match self.manager.spawn_from_request(req).await {
            Ok(outcome) => outcome,
            Err(e) => return ToolOutput::err(&call.id, e.to_string()),
        };

        let wait = match self.manager.wait_for_exit(&outcome.job_id, timeout_ms).await {
            Ok(wait) => wait,
            Err(e) => return ToolOutput::err(&call.id, e.to_string()),
        };

        if !wait.exited {
            return ToolOutput::json(
                &call.id,
                &json!({
                    "jobId": outcome.job_id,
                    "status": "running",
                    "message": "still running after timeoutMs; poll with status/result",
                }),
            );
        }

        match self.manager.result(&outcome.job_id, ResultView::FinalMessage).await {
            Ok(ResultOutput::Text(text)) => ToolOutput::ok(&call.id, text),
            Ok(ResultOutput::Full(_)) => unreachable!("FinalMessage view always yields Text"),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
