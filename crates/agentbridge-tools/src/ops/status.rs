// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::str_field;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct StatusTool {
    manager: Arc<JobManager>,
}

impl StatusTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for StatusTool {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Returns the current status of a subagent job: running, done, failed, or canceled, along with timestamps and exit code."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string" }
            },
            "required": ["jobId"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(job_id) = str_field(&call.args, "jobId") else {
            return ToolOutput::err(&call.id, "missing required field: jobId");
        };
        match self.manager.status(&job_id).await {
            Ok(view) => ToolOutput::json(&call.id, &view),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
