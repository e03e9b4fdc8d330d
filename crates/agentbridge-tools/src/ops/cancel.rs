// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::{bool_field, str_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct CancelTool {
    manager: Arc<JobManager>,
}

impl CancelTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for CancelTool {
    fn name(&self) -> &str {
        "cancel"
    }

    fn description(&self) -> &str {
        "Requests cancellation of a running subagent job: SIGTERM by default, or an immediate \
         SIGKILL when force is set. A job that is not running is left untouched and reports failure."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string" },
                "force": { "type": "boolean", "default": false }
            },
            "required": ["jobId"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(job_id) = str_field(&call.args, "jobId") else {
            return ToolOutput::err(&call.id, "missing required field: jobId");
        };
        let force = bool_field(&call.args, "force");
        match self.manager.cancel(&job_id, force).await {
            Ok(outcome) => ToolOutput::json(&call.id, &outcome),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
