// SPDX-License-Identifier: MIT
//! The normalized event taxonomy and the pure classification function that
//! produces it from a raw decoded JSONL line emitted by the agent.

use serde::Serialize;
use serde_json::{json, Value};

/// Fixed taxonomy every raw agent event is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    Progress,
    ToolCall,
    ToolResult,
    Error,
    Final,
}

/// One record in the manager-owned event stream for a job. Immutable once
/// appended to a job's event vector.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub content: Value,
    /// ISO-8601 timestamp assigned when the event was ingested by the
    /// manager, not when the child claims it was emitted.
    pub timestamp: String,
}

impl NormalizedEvent {
    pub fn new(event_type: EventType, content: Value) -> Self {
        Self {
            event_type,
            content,
            timestamp: now_iso8601(),
        }
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Classify a decoded JSON value from one stdout line into zero or one
/// [`NormalizedEvent`]. Returns `None` only when `raw` is not a JSON object
/// or lacks a string `type` field; every other shape — including unknown
/// `type` values — produces an event. Never consults external state.
pub fn normalize(raw: &Value) -> Option<NormalizedEvent> {
    let obj = raw.as_object()?;
    let kind = obj.get("type")?.as_str()?;

    let event = match kind {
        "thread.started" => NormalizedEvent::new(
            EventType::Progress,
            json!({ "threadId": obj.get("threadId").cloned().unwrap_or(Value::Null) }),
        ),
        "turn.started" => {
            NormalizedEvent::new(EventType::Progress, json!({ "kind": "turn.started" }))
        }
        "turn.completed" => NormalizedEvent::new(
            EventType::Progress,
            json!({
                "kind": "turn.completed",
                "usage": obj.get("usage").cloned().unwrap_or(Value::Null),
            }),
        ),
        "turn.failed" => NormalizedEvent::new(
            EventType::Error,
            json!({
                "kind": "turn.failed",
                "error": obj.get("error").cloned().unwrap_or(Value::Null),
            }),
        ),
        "error" => NormalizedEvent::new(EventType::Error, raw.clone()),
        "item.started" | "item.updated" | "item.completed" => {
            classify_item(kind, obj.get("item"))
        }
        _ => NormalizedEvent::new(EventType::Progress, raw.clone()),
    };

    Some(event)
}

/// Whether a wrapper kind (`item.started`/`item.updated`/`item.completed`)
/// represents the terminal state of an item lifecycle — used solely to pick
/// between `tool_call` and `tool_result`.
fn is_completed(wrapper_kind: &str) -> bool {
    wrapper_kind == "item.completed"
}

fn classify_item(wrapper_kind: &str, item: Option<&Value>) -> NormalizedEvent {
    let completed = is_completed(wrapper_kind);
    let tool_type = if completed {
        EventType::ToolResult
    } else {
        EventType::ToolCall
    };

    let Some(item) = item else {
        return NormalizedEvent::new(
            EventType::Progress,
            json!({ "kind": wrapper_kind, "item": Value::Null }),
        );
    };

    let item_type = item.get("type").and_then(Value::as_str);
    let item_id = item.get("id").cloned().unwrap_or(Value::Null);

    match item_type {
        None => NormalizedEvent::new(
            EventType::Progress,
            json!({ "kind": wrapper_kind, "item": item }),
        ),
        Some("agent_message") => NormalizedEvent::new(
            EventType::Message,
            json!({
                "kind": wrapper_kind,
                "itemType": "agent_message",
                "itemId": item_id,
                "text": item.get("text").cloned().unwrap_or(Value::Null),
            }),
        ),
        Some("reasoning") => NormalizedEvent::new(
            EventType::Progress,
            json!({
                "kind": wrapper_kind,
                "itemType": "reasoning",
                "itemId": item_id,
                "text": item.get("text").cloned().unwrap_or(Value::Null),
            }),
        ),
        Some("command_execution") => NormalizedEvent::new(
            tool_type,
            json!({
                "command": item.get("command").cloned().unwrap_or(Value::Null),
                "status": item.get("status").cloned().unwrap_or(Value::Null),
                "exitCode": item.get("exitCode").cloned().unwrap_or(Value::Null),
            }),
        ),
        Some("file_change") => NormalizedEvent::new(
            tool_type,
            json!({
                "changes": item.get("changes").cloned().unwrap_or(Value::Null),
                "status": item.get("status").cloned().unwrap_or(Value::Null),
            }),
        ),
        Some("mcp_tool_call") => NormalizedEvent::new(
            tool_type,
            json!({
                "server": item.get("server").cloned().unwrap_or(Value::Null),
                "tool": item.get("tool").cloned().unwrap_or(Value::Null),
                "status": item.get("status").cloned().unwrap_or(Value::Null),
                "arguments": item.get("arguments").cloned().unwrap_or(Value::Null),
                "result": item.get("result").cloned().unwrap_or(Value::Null),
                "error": item.get("error").cloned().unwrap_or(Value::Null),
            }),
        ),
        Some("web_search") => NormalizedEvent::new(
            tool_type,
            json!({ "query": item.get("query").cloned().unwrap_or(Value::Null) }),
        ),
        Some("todo_list") => NormalizedEvent::new(
            EventType::Progress,
            json!({ "items": item.get("items").cloned().unwrap_or(Value::Null) }),
        ),
        Some("error") => NormalizedEvent::new(
            EventType::Error,
            json!({ "message": item.get("message").cloned().unwrap_or(Value::Null) }),
        ),
        Some(_other) => NormalizedEvent::new(
            EventType::Progress,
            json!({ "kind": wrapper_kind, "item": item }),
        ),
    }
}
