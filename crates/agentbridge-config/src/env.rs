// SPDX-License-Identifier: Apache-2.0
//! Environment variables consulted by the core job manager.
//!
//! Both are read fresh on every call rather than cached, so an outer
//! orchestrator can tune admission and sandbox defaults without restarting
//! the server.

use std::str::FromStr;

use crate::SandboxPolicy;

/// Concurrency cap used when `AGENTBRIDGE_MAX_CONCURRENT_JOBS` is unset or
/// does not parse as a positive integer.
pub const DEFAULT_CONCURRENCY_CAP: usize = 32;

/// The sandbox applied when a spawn request supplies none and no
/// environment default is configured.
pub fn default_sandbox() -> Option<SandboxPolicy> {
    std::env::var("AGENTBRIDGE_DEFAULT_SANDBOX")
        .ok()
        .and_then(|v| SandboxPolicy::from_str(&v).ok())
}

/// The maximum number of jobs allowed in `running` status at once.
pub fn concurrency_cap() -> usize {
    std::env::var("AGENTBRIDGE_MAX_CONCURRENT_JOBS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_CONCURRENCY_CAP)
}
