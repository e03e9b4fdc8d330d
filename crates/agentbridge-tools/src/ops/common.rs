// SPDX-License-Identifier: MIT
//! Argument parsing shared by the individual operations. Malformed shapes
//! here are the outer validation layer's job in a real deployment; these
//! helpers just decode what has already been validated as JSON.

use std::str::FromStr;

use agentbridge_config::{ReasoningEffort, SandboxPolicy};
use agentbridge_core::SpawnRequest;
use serde_json::Value;

pub fn str_field(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn bool_field(args: &Value, key: &str) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub fn u64_field(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

pub fn usize_field(args: &Value, key: &str) -> Option<usize> {
    args.get(key).and_then(Value::as_u64).map(|v| v as usize)
}

pub fn reasoning_effort_field(args: &Value, key: &str) -> Result<Option<ReasoningEffort>, String> {
    match str_field(args, key) {
        None => Ok(None),
        Some(s) => ReasoningEffort::from_str(&s)
            .map(Some)
            .map_err(|e| format!("invalid {key}: {e}")),
    }
}

pub fn sandbox_field(args: &Value, key: &str) -> Result<Option<SandboxPolicy>, String> {
    match str_field(args, key) {
        None => Ok(None),
        Some(s) => SandboxPolicy::from_str(&s)
            .map(Some)
            .map_err(|e| format!("invalid {key}: {e}")),
    }
}

/// Parses a `spawn`-shaped argument object into a [`SpawnRequest`]. `prompt`
/// is required; every other field is optional.
pub fn parse_spawn_request(args: &Value) -> Result<SpawnRequest, String> {
    let prompt = str_field(args, "prompt").ok_or_else(|| "missing required field: prompt".to_string())?;

    Ok(SpawnRequest {
        prompt,
        model: str_field(args, "model"),
        reasoning_effort: reasoning_effort_field(args, "reasoningEffort")?,
        sandbox: sandbox_field(args, "sandbox")?,
        full_auto: bool_field(args, "fullAuto"),
        working_directory: str_field(args, "workingDirectory"),
        label: str_field(args, "label"),
    })
}

/// Clamps a caller-specified millisecond value to `[0, max]`, per spec's
/// "negative/non-finite values are clamped to zero; hard caps per operation"
/// rule. JSON cannot carry non-finite numbers, so only the lower bound and
/// cap matter here.
pub fn clamp_ms(value: Option<u64>, default: u64, max: u64) -> u64 {
    value.unwrap_or(default).min(max)
}
