// SPDX-License-Identifier: MIT
//! Fan-out helper layered on top of `spawn`: spawns several jobs from one
//! call, isolating per-item failures, and optionally attaches a short
//! handshake event tail to each successfully spawned job so the caller can
//! tell at a glance whether it came up cleanly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

use agentbridge_core::JobManager;

use crate::ops::common::{bool_field, parse_spawn_request, usize_field};
use crate::tool::{Tool, ToolCall, ToolOutput};

const HANDSHAKE_WAIT: Duration = Duration::from_millis(500);
const DEFAULT_HANDSHAKE_MAX_EVENTS: usize = 10;
const MAX_HANDSHAKE_MAX_EVENTS: usize = 25;

pub struct SpawnGroupTool {
    manager: Arc<JobManager>,
}

impl SpawnGroupTool {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum GroupItemOutcome {
    Spawned {
        #[serde(rename = "jobId")]
        job_id: String,
        status: agentbridge_core::JobStatus,
        #[serde(rename = "startedAt")]
        started_at: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        handshake: Option<Vec<agentbridge_core::NormalizedEvent>>,
    },
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

fn merge_defaults(item: &Value, defaults: &Value) -> Value {
    let Some(item_obj) = item.as_object() else {
        return item.clone();
    };
    let Some(default_obj) = defaults.as_object() else {
        return item.clone();
    };
    let mut merged = Map::new();
    for (k, v) in default_obj {
        merged.insert(k.clone(), v.clone());
    }
    for (k, v) in item_obj {
        merged.insert(k.clone(), v.clone());
    }
    Value::Object(merged)
}

#[async_trait]
impl Tool for SpawnGroupTool {
    fn name(&self) -> &str {
        "spawn_group"
    }

    fn description(&self) -> &str {
        "Spawns several subagent jobs from one call. Each job array item is a spawn-shaped object; \
         fields omitted there fall back to defaults. A failure spawning one job never blocks the \
         others. With includeHandshake set, each successful spawn is given a brief grace period and \
         its earliest events are attached so the caller can confirm it started cleanly."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "jobs": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "prompt": { "type": "string" },
                            "model": { "type": "string" },
                            "reasoningEffort": { "type": "string", "enum": ["low", "medium", "high"] },
                            "sandbox": { "type": "string", "enum": ["read-only", "workspace-write", "danger-full-access"] },
                            "fullAuto": { "type": "boolean" },
                            "workingDirectory": { "type": "string" },
                            "label": { "type": "string" }
                        },
                        "required": ["prompt"]
                    }
                },
                "defaults": {
                    "type": "object",
                    "properties": {
                        "model": { "type": "string" },
                        "reasoningEffort": { "type": "string", "enum": ["low", "medium", "high"] },
                        "sandbox": { "type": "string", "enum": ["read-only", "workspace-write", "danger-full-access"] },
                        "fullAuto": { "type": "boolean" },
                        "workingDirectory": { "type": "string" }
                    }
                },
                "includeHandshake": { "type": "boolean", "default": false },
                "handshakeMaxEvents": { "type": "integer", "minimum": 0, "maximum": MAX_HANDSHAKE_MAX_EVENTS, "default": DEFAULT_HANDSHAKE_MAX_EVENTS }
            },
            "required": ["jobs"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(jobs) = call.args.get("jobs").and_then(Value::as_array) else {
            return ToolOutput::err(&call.id, "missing required field: jobs");
        };
        if jobs.is_empty() {
            return ToolOutput::err(&call.id, "jobs must contain at least one entry");
        }
        let defaults = call.args.get("defaults").cloned().unwrap_or(Value::Null);
        let include_handshake = bool_field(&call.args, "includeHandshake");
        let handshake_max_events = usize_field(&call.args, "handshakeMaxEvents")
            .unwrap_or(DEFAULT_HANDSHAKE_MAX_EVENTS)
            .min(MAX_HANDSHAKE_MAX_EVENTS);

        let mut results = Vec::with_capacity(jobs.len());
        for item in jobs {
            let merged = merge_defaults(item, &defaults);
            let label = merged.get("label").and_then(Value::as_str).map(str::to_string);

            let req = match parse_spawn_request(&merged) {
                Ok(req) => req,
                Err(e) => {
                    results.push(GroupItemOutcome::Failed { error: e, label });
                    continue;
                }
            };

            match self.manager.spawn_from_request(req).await {
                Ok(outcome) => {
                    let handshake = if include_handshake {
                        tokio::time::sleep(HANDSHAKE_WAIT).await;
                        self.manager
                            .get_event_tail(&outcome.job_id, handshake_max_events, None)
                            .await
                            .ok()
                    } else {
                        None
                    };
                    results.push(GroupItemOutcome::Spawned {
                        job_id: outcome.job_id,
                        status: outcome.status,
                        started_at: outcome.started_at,
                        label,
                        handshake,
                    });
                }
                Err(e) => {
                    results.push(GroupItemOutcome::Failed { error: e.to_string(), label });
                }
            }
        }

        ToolOutput::json(&call.id, &json!({ "jobs": results }))
    }
}
