// SPDX-License-Identifier: MIT
//! Thin policy layer composing cancel + bounded wait + respawn-with-
//! injected-event-tail. Holds no state of its own beyond a manager handle.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::event::{EventType, NormalizedEvent};
use crate::job::{overlay_overrides, EffectiveOverrides, JobStatus};
use crate::manager::JobManager;

const DEFAULT_WAIT_MS: u64 = 250;
const MAX_WAIT_MS: u64 = 60_000;
const DEFAULT_TAIL_MAX_EVENTS: usize = 25;
const MAX_TAIL_EVENTS: usize = 25;

const REFRESH_REMINDER: &str =
    "Re-read any files you intend to edit before making changes; they may have changed since the prior job's context was captured.";

#[derive(Debug, Clone)]
pub struct InterruptRequest {
    pub job_id: String,
    pub new_prompt: String,
    pub wait_ms: Option<u64>,
    pub include_event_tail: Option<bool>,
    pub tail_max_events: Option<usize>,
    pub overrides: Option<EffectiveOverrides>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptOutcome {
    pub previous_job_id: String,
    pub previous_status: JobStatus,
    pub respawned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InterruptOutcome {
    fn refusal(previous_job_id: String, previous_status: JobStatus, reason: impl Into<String>) -> Self {
        Self {
            previous_job_id,
            previous_status,
            respawned: false,
            new_job_id: None,
            reason: Some(reason.into()),
        }
    }
}

pub struct InterruptCoordinator {
    manager: Arc<JobManager>,
}

impl InterruptCoordinator {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }

    pub async fn interrupt(&self, req: InterruptRequest) -> Result<InterruptOutcome, CoreError> {
        let wait_ms = req.wait_ms.unwrap_or(DEFAULT_WAIT_MS).min(MAX_WAIT_MS);
        let include_tail = req.include_event_tail.unwrap_or(true);
        let tail_max_events = req
            .tail_max_events
            .unwrap_or(DEFAULT_TAIL_MAX_EVENTS)
            .min(MAX_TAIL_EVENTS);

        // 1. Read status; refuse outright if not running.
        let status = self.manager.status(&req.job_id).await?;
        if status.status != JobStatus::Running {
            return Ok(InterruptOutcome::refusal(
                req.job_id.clone(),
                status.status,
                format!("job is not running (status={})", status_name(status.status)),
            ));
        }

        // 2. Capture spawn metadata (requested args + resolved effective
        // options + label) before anything else can mutate it.
        let spawn_metadata = self.manager.get_spawn_metadata(&req.job_id).await?;

        // 3. Snapshot the event tail, filtered to message/error/progress.
        let tail = if include_tail {
            let allow = [EventType::Message, EventType::Error, EventType::Progress];
            self.manager
                .get_event_tail(&req.job_id, tail_max_events, Some(&allow))
                .await?
        } else {
            Vec::new()
        };

        // 4. Request graceful cancellation.
        let cancel = self.manager.cancel(&req.job_id, false).await?;
        if !cancel.success {
            let current = self.manager.status(&req.job_id).await?;
            return Ok(InterruptOutcome::refusal(
                req.job_id.clone(),
                current.status,
                format!("job is not running (status={})", status_name(current.status)),
            ));
        }

        // 5. Bounded wait for the child to actually exit.
        if wait_ms > 0 {
            let _ = self.manager.wait_for_exit(&req.job_id, wait_ms).await?;
        }

        // 6. Re-check: refuse to respawn if it completed naturally.
        let current = self.manager.status(&req.job_id).await?;
        if matches!(current.status, JobStatus::Done | JobStatus::Failed) {
            return Ok(InterruptOutcome::refusal(
                req.job_id.clone(),
                current.status,
                "job completed naturally while waiting for cancellation",
            ));
        }

        // 7. Overlay overrides onto the captured effective options.
        let overrides = req.overrides.clone().unwrap_or_default();
        let new_effective = overlay_overrides(&spawn_metadata.effective, &overrides);

        // 8. Build the respawn prompt with the fixed headers.
        let prompt = build_respawn_prompt(&req.job_id, &tail, &req.new_prompt);

        // 9. Respawn, inheriting the label.
        let spawned = self
            .manager
            .spawn_from_effective(new_effective, prompt, spawn_metadata.label)
            .await?;

        Ok(InterruptOutcome {
            previous_job_id: req.job_id,
            previous_status: current.status,
            respawned: true,
            new_job_id: Some(spawned.job_id),
            reason: None,
        })
    }
}

fn status_name(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Running => "running",
        JobStatus::Done => "done",
        JobStatus::Failed => "failed",
        JobStatus::Canceled => "canceled",
    }
}

fn build_respawn_prompt(job_id: &str, tail: &[NormalizedEvent], new_prompt: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Prior Context (from interrupted job {job_id})\n"));
    if tail.is_empty() {
        out.push_str("(no captured events)\n");
    } else {
        for event in tail {
            out.push_str(&format!(
                "[{}] {}: {}\n",
                event.timestamp,
                event_type_name(event.event_type),
                summarize_content(&event.content)
            ));
        }
    }
    out.push_str("\nUpdated Instructions\n");
    out.push_str(new_prompt);
    out.push('\n');
    out.push_str(REFRESH_REMINDER);
    out
}

fn event_type_name(t: EventType) -> &'static str {
    match t {
        EventType::Message => "message",
        EventType::Progress => "progress",
        EventType::ToolCall => "tool_call",
        EventType::ToolResult => "tool_result",
        EventType::Error => "error",
        EventType::Final => "final",
    }
}

/// A string payload is used verbatim; anything else falls back to its JSON
/// encoding, per the spec's accepted implementation-defined choice.
fn summarize_content(content: &Value) -> String {
    if let Some(text) = content.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
