// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::{str_field, usize_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

const DEFAULT_MAX_EVENTS: usize = 200;
const MAX_MAX_EVENTS: usize = 2000;

pub struct EventsTool {
    manager: Arc<JobManager>,
}

impl EventsTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for EventsTool {
    fn name(&self) -> &str {
        "events"
    }

    fn description(&self) -> &str {
        "Pages through the normalized event stream emitted by a subagent job since it was spawned, \
         oldest first. Pass the nextCursor from a prior call to resume; an empty cursor starts from \
         the beginning."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string" },
                "cursor": { "type": "string" },
                "maxEvents": { "type": "integer", "minimum": 1, "maximum": MAX_MAX_EVENTS, "default": DEFAULT_MAX_EVENTS }
            },
            "required": ["jobId"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(job_id) = str_field(&call.args, "jobId") else {
            return ToolOutput::err(&call.id, "missing required field: jobId");
        };
        let cursor = str_field(&call.args, "cursor");
        let max_events = usize_field(&call.args, "maxEvents")
            .unwrap_or(DEFAULT_MAX_EVENTS)
            .min(MAX_MAX_EVENTS);

        match self.manager.get_events(&job_id, cursor.as_deref(), max_events).await {
            Ok(page) => ToolOutput::json(&call.id, &page),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
