// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_core::JobManager;

use crate::ops::common::str_field;
use crate::tool::{Tool, ToolCall, ToolOutput};

pub struct GetSpawnMetadataTool {
    manager: Arc<JobManager>,
}

impl GetSpawnMetadataTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for GetSpawnMetadataTool {
    fn name(&self) -> &str {
        "get_spawn_metadata"
    }

    fn description(&self) -> &str {
        "Returns the arguments a job was originally spawned with, the effective options actually \
         applied after precedence resolution, and its label."
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
        match self.manager.get_spawn_metadata(&job_id).await {
            Ok(metadata) => ToolOutput::json(&call.id, &metadata),
            Err(e) => ToolOutput::err(&call.id, e.to_string()),
        }
    }
}
