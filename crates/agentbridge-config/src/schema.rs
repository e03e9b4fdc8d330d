// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reasoning effort forwarded to the agent as
/// `-c model_reasoning_effort="<r>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(format!("unknown reasoning effort: {other}")),
        }
    }
}

/// Sandbox policy forwarded to the agent as `--sandbox <s>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxPolicy {
    ReadOnly,
    WorkspaceWrite,
    DangerFullAccess,
}

impl fmt::Display for SandboxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SandboxPolicy::ReadOnly => "read-only",
            SandboxPolicy::WorkspaceWrite => "workspace-write",
            SandboxPolicy::DangerFullAccess => "danger-full-access",
        };
        f.write_str(s)
    }
}

impl FromStr for SandboxPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read-only" => Ok(SandboxPolicy::ReadOnly),
            "workspace-write" => Ok(SandboxPolicy::WorkspaceWrite),
            "danger-full-access" => Ok(SandboxPolicy::DangerFullAccess),
            other => Err(format!("unknown sandbox policy: {other}")),
        }
    }
}

/// Precedence-resolved default used when a spawn request omits `sandbox`.
pub const DEFAULT_SANDBOX_WHEN_UNSET: SandboxPolicy = SandboxPolicy::WorkspaceWrite;

fn default_agent_command() -> String {
    "codex".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Binary invoked for every spawn. Overridable in config for test
    /// fixtures or alternate agent builds; never user-suppliable per call.
    #[serde(default = "default_agent_command")]
    pub command: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Overrides `RUST_LOG` when set. Ignored if `RUST_LOG` is present.
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
