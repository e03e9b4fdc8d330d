// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::{JobManager, ResultOutput, ResultView};

use crate::ops::common::str_field;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct ResultTool {
    manager: Arc<JobManager>,
}

impl ResultTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

fn parse_view(args: &Value) -> Result<ResultView, String> {
    match str_field(args, "view").as_deref() {
        None | Some("finalMessage") => Ok(ResultView::FinalMessage),
        Some("full") => Ok(ResultView::Full),
        Some(other) => Err(format!("invalid view: {other} (expected \"full\" or \"finalMessage\")")),
    }
}

#[async_trait]
impl Tool for ResultTool {
    fn name(&self) -> &str {
        "result"
    }

    fn description(&self) -> &str {
        "Fetches the outcome of a subagent job. The finalMessage view (default) returns just the \
         agent's last message as plain text; the full view returns status, timing, exit code, and \
         bounded stdout/stderr tails as well."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string" },
                "view": { "type": "string", "enum": ["finalMessage", "full"], "default": "finalMessage" }
            },
            "required": ["jobId"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(job_id) = str_field(&call.args, "jobId") else {
            return ToolOutput::err(&call.id, "missing required field: jobId");
        };
        let view = match parse_view(&call.args) {
            Ok(v) => v,
            Err(e) => return ToolOutput::err(&call.id, e),
        };
        match self.manager.result(&job_id, view).await {
            Ok(ResultOutput::Text(text)) => ToolOutput::ok(&call.id, text),
            Ok(full @ ResultOutput::Full(_)) => ToolOutput::json(&call.id, &full),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
