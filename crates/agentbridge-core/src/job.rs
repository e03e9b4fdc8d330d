// SPDX-License-Identifier: MIT
//! Types describing a subagent job: its resolved options, its public
//! status/metadata surface, and the internal record the manager mutates.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::process::Child;
use tokio::sync::watch;

use agentbridge_config::{ReasoningEffort, SandboxPolicy};

use crate::event::NormalizedEvent;
use crate::tail_buffer::TailBuffer;

/// One of the three terminal states, or the initial `running` state. No
/// transition ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Done,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Caller-requested spawn options, before precedence resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(default)]
    pub sandbox: Option<SandboxPolicy>,
    #[serde(default)]
    pub full_auto: bool,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Settings actually applied to a spawned child, after precedence
/// resolution. Respawned verbatim by interrupt when inheriting a prior
/// job's configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveOptions {
    pub model: Option<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub sandbox: Option<SandboxPolicy>,
    /// Whether `--full-auto` was passed. Always false when `sandbox` is
    /// `Some` — an explicit sandbox always suppresses full-auto.
    pub use_full_auto: bool,
    pub working_directory: Option<String>,
}

/// Overrides a caller may supply to `interrupt`, overlaid onto a captured
/// job's effective options before respawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveOverrides {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(default)]
    pub sandbox: Option<SandboxPolicy>,
    #[serde(default)]
    pub full_auto: Option<bool>,
    #[serde(default)]
    pub working_directory: Option<String>,
}

/// Resolves sandbox/full-auto precedence for a fresh spawn-from-request:
/// caller-supplied sandbox, then the server-environment default, then
/// `workspace-write`. An explicit `fullAuto` request with no sandbox
/// resolved from either source leaves sandbox unset and sets
/// `useFullAuto`; any resolved sandbox always suppresses full-auto.
pub fn resolve_effective_options(
    req: &SpawnRequest,
    env_default_sandbox: Option<SandboxPolicy>,
) -> EffectiveOptions {
    let resolved_sandbox = req.sandbox.or(env_default_sandbox);

    let (sandbox, use_full_auto) = match resolved_sandbox {
        Some(s) => (Some(s), false),
        None => {
            if req.full_auto {
                (None, true)
            } else {
                (Some(agentbridge_config::DEFAULT_SANDBOX_WHEN_UNSET), false)
            }
        }
    };

    EffectiveOptions {
        model: req.model.clone(),
        reasoning_effort: req.reasoning_effort,
        sandbox,
        use_full_auto,
        working_directory: req.working_directory.clone(),
    }
}

/// Overlays `overrides` onto `base`, reapplying the sandbox-suppresses-
/// full-auto rule so the result is internally consistent.
pub fn overlay_overrides(base: &EffectiveOptions, overrides: &EffectiveOverrides) -> EffectiveOptions {
    let model = overrides.model.clone().or_else(|| base.model.clone());
    let reasoning_effort = overrides.reasoning_effort.or(base.reasoning_effort);
    let sandbox = overrides.sandbox.or(base.sandbox);
    let working_directory = overrides
        .working_directory
        .clone()
        .or_else(|| base.working_directory.clone());

    let (sandbox, use_full_auto) = match sandbox {
        Some(s) => (Some(s), false),
        None => {
            let full_auto = overrides.full_auto.unwrap_or(base.use_full_auto);
            (None, full_auto)
        }
    };

    EffectiveOptions {
        model,
        reasoning_effort,
        sandbox,
        use_full_auto,
        working_directory,
    }
}

/// Bundles the caller-requested arguments, the resolved effective options,
/// and an optional coordinator label. Echoed back verbatim, never consulted
/// during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnMetadata {
    pub requested: SpawnRequest,
    pub effective: EffectiveOptions,
    pub label: Option<String>,
}

/// The internal, manager-owned record for one job. Never exposed directly;
/// readers receive defensive copies of its fields.
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<i32>,
    pub cancel_requested: bool,
    pub turn_completed: bool,
    pub child: Option<Child>,
    pub stdout_tail: TailBuffer,
    pub stderr_tail: TailBuffer,
    pub events: VecDeque<NormalizedEvent>,
    pub last_agent_message: Option<String>,
    pub spawn_metadata: SpawnMetadata,
    /// Fires exactly once, at child termination or spawn error. `true`
    /// once fired; never reset.
    pub completion_tx: watch::Sender<bool>,
}

impl JobRecord {
    pub fn completion_rx(&self) -> watch::Receiver<bool> {
        self.completion_tx.subscribe()
    }

    pub fn fire_completion(&self) {
        let _ = self.completion_tx.send(true);
    }
}
