// SPDX-License-Identifier: MIT
//! The subagent job manager: spawns agent child processes, ingests their
//! stdout/stderr, and exposes the reader/mutator operations the tool layer
//! calls.

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::event::{normalize, EventType, NormalizedEvent};
use crate::job::{resolve_effective_options, EffectiveOptions, JobRecord, JobStatus, SpawnMetadata, SpawnRequest};
use crate::line_framer::LineFramer;
use crate::tail_buffer::TailBuffer;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnOutcome {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    Full,
    FinalMessage,
}

impl Default for ResultView {
    fn default() -> Self {
        ResultView::FinalMessage
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub exit_code: Option<i32>,
    pub final_message: String,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResultOutput {
    Text(String),
    Full(Box<FullResult>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub events: Vec<NormalizedEvent>,
    pub next_cursor: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitForExitOutcome {
    pub exited: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitAnyOutcome {
    pub completed_job_id: Option<String>,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_job_ids: Vec<String>,
}

enum StreamKind {
    Stdout,
    Stderr,
}

/// Owns every job ever spawned for the lifetime of the process. Never
/// garbage-collects terminal records (I7).
pub struct JobManager {
    agent_command: String,
    jobs: RwLock<HashMap<String, Arc<Mutex<JobRecord>>>>,
}

impl JobManager {
    pub fn new(agent_command: impl Into<String>) -> Self {
        Self {
            agent_command: agent_command.into(),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    async fn get_record(&self, job_id: &str) -> Result<Arc<Mutex<JobRecord>>, CoreError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownJob(job_id.to_string()))
    }

    /// Resolves sandbox/full-auto precedence from a caller-supplied request,
    /// then spawns.
    pub async fn spawn_from_request(&self, req: SpawnRequest) -> Result<SpawnOutcome, CoreError> {
        let effective = resolve_effective_options(&req, agentbridge_config::default_sandbox());
        let prompt = req.prompt.clone();
        let label = req.label.clone();
        let metadata = SpawnMetadata {
            requested: req,
            effective,
            label,
        };
        self.spawn(metadata, prompt).await
    }

    /// Spawns from already-resolved options, used by the interrupt
    /// coordinator to inherit a prior job's configuration verbatim.
    pub async fn spawn_from_effective(
        &self,
        effective: EffectiveOptions,
        prompt: String,
        label: Option<String>,
    ) -> Result<SpawnOutcome, CoreError> {
        let requested = SpawnRequest {
            prompt: prompt.clone(),
            model: effective.model.clone(),
            reasoning_effort: effective.reasoning_effort,
            sandbox: effective.sandbox,
            full_auto: effective.use_full_auto,
            working_directory: effective.working_directory.clone(),
            label: label.clone(),
        };
        let metadata = SpawnMetadata {
            requested,
            effective,
            label,
        };
        self.spawn(metadata, prompt).await
    }

    async fn spawn(&self, metadata: SpawnMetadata, prompt: String) -> Result<SpawnOutcome, CoreError> {
        let cap = agentbridge_config::concurrency_cap();
        let args = build_argv(&metadata.effective, &prompt);

        // Hold the write lock across the admission check and the insert so
        // two concurrent spawns can never both slip past the cap (P6).
        let mut jobs = self.jobs.write().await;

        let mut running = 0usize;
        for rec in jobs.values() {
            if rec.lock().await.status == JobStatus::Running {
                running += 1;
            }
        }
        if running >= cap {
            return Err(CoreError::TooManyConcurrentJobs { cap });
        }

        let job_id = Uuid::new_v4().to_string();
        let started_at = now_iso8601();

        let spawned_event = NormalizedEvent::new(
            EventType::Progress,
            json!({
                "kind": "spawned",
                "command": self.agent_command,
                "args": args,
                "effectiveSandbox": metadata.effective.sandbox,
                "label": metadata.label,
            }),
        );

        let mut command = Command::new(&self.agent_command);
        command.args(&args);
        if let Some(dir) = &metadata.effective.working_directory {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        match command.spawn() {
            Ok(mut child) => {
                let stdout = child.stdout.take().expect("stdout was piped");
                let stderr = child.stderr.take().expect("stderr was piped");

                let mut events = VecDeque::new();
                events.push_back(spawned_event);

                let (completion_tx, _rx) = watch::channel(false);
                let record = Arc::new(Mutex::new(JobRecord {
                    job_id: job_id.clone(),
                    status: JobStatus::Running,
                    started_at: started_at.clone(),
                    finished_at: None,
                    exit_code: None,
                    exit_signal: None,
                    cancel_requested: false,
                    turn_completed: false,
                    child: Some(child),
                    stdout_tail: TailBuffer::with_default_cap(),
                    stderr_tail: TailBuffer::with_default_cap(),
                    events,
                    last_agent_message: None,
                    spawn_metadata: metadata,
                    completion_tx,
                }));

                jobs.insert(job_id.clone(), record.clone());
                drop(jobs);

                spawn_stream_reader(record.clone(), stdout, StreamKind::Stdout);
                spawn_stream_reader(record.clone(), stderr, StreamKind::Stderr);
                spawn_waiter(record);

                Ok(SpawnOutcome {
                    job_id,
                    status: JobStatus::Running,
                    started_at,
                })
            }
            Err(e) => {
                warn!(error = %e, command = %self.agent_command, "failed to spawn agent process");
                let mut events = VecDeque::new();
                events.push_back(spawned_event);
                events.push_back(NormalizedEvent::new(
                    EventType::Error,
                    json!({ "message": format!("failed to spawn agent process: {e}") }),
                ));

                let (completion_tx, _rx) = watch::channel(true);
                let record = Arc::new(Mutex::new(JobRecord {
                    job_id: job_id.clone(),
                    status: JobStatus::Failed,
                    started_at: started_at.clone(),
                    finished_at: Some(now_iso8601()),
                    exit_code: None,
                    exit_signal: None,
                    cancel_requested: false,
                    turn_completed: false,
                    child: None,
                    stdout_tail: TailBuffer::with_default_cap(),
                    stderr_tail: TailBuffer::with_default_cap(),
                    events,
                    last_agent_message: None,
                    spawn_metadata: metadata,
                    completion_tx,
                }));
                jobs.insert(job_id.clone(), record);

                Ok(SpawnOutcome {
                    job_id,
                    status: JobStatus::Failed,
                    started_at,
                })
            }
        }
    }

    pub async fn status(&self, job_id: &str) -> Result<StatusView, CoreError> {
        let record = self.get_record(job_id).await?;
        let job = record.lock().await;
        Ok(StatusView {
            job_id: job.job_id.clone(),
            status: job.status,
            started_at: job.started_at.clone(),
            finished_at: job.finished_at.clone(),
            exit_code: job.exit_code,
        })
    }

    pub async fn result(&self, job_id: &str, view: ResultView) -> Result<ResultOutput, CoreError> {
        let record = self.get_record(job_id).await?;
        let job = record.lock().await;
        let final_message = final_message_for(&job);
        Ok(match view {
            ResultView::FinalMessage => ResultOutput::Text(final_message),
            ResultView::Full => ResultOutput::Full(Box::new(FullResult {
                job_id: job.job_id.clone(),
                status: job.status,
                started_at: job.started_at.clone(),
                finished_at: job.finished_at.clone(),
                exit_code: job.exit_code,
                final_message,
                stdout_tail: job.stdout_tail.as_str_lossy(),
                stderr_tail: job.stderr_tail.as_str_lossy(),
            })),
        })
    }

    pub async fn get_spawn_metadata(&self, job_id: &str) -> Result<SpawnMetadata, CoreError> {
        let record = self.get_record(job_id).await?;
        let job = record.lock().await;
        Ok(job.spawn_metadata.clone())
    }

    /// Cursor is a decimal index into the append-only event vector. Invalid
    /// cursors (negative, non-numeric, non-finite) clamp to 0 (B2).
    pub async fn get_events(
        &self,
        job_id: &str,
        cursor: Option<&str>,
        max_events: usize,
    ) -> Result<EventsPage, CoreError> {
        let record = self.get_record(job_id).await?;
        let job = record.lock().await;
        let len = job.events.len();
        let start = parse_cursor(cursor).min(len);
        let count = max_events.max(1).min(len - start);
        let events = job.events.iter().skip(start).take(count).cloned().collect();
        let end = start + count;
        Ok(EventsPage {
            events,
            next_cursor: end.to_string(),
            done: job.status != JobStatus::Running,
        })
    }

    pub async fn get_event_tail(
        &self,
        job_id: &str,
        max_events: usize,
        allow_list: Option<&[EventType]>,
    ) -> Result<Vec<NormalizedEvent>, CoreError> {
        let record = self.get_record(job_id).await?;
        let job = record.lock().await;
        if max_events == 0 {
            return Ok(Vec::new());
        }
        let filtered: Vec<&NormalizedEvent> = job
            .events
            .iter()
            .filter(|e| allow_list.map_or(true, |types| types.contains(&e.event_type)))
            .collect();
        let start = filtered.len().saturating_sub(max_events);
        Ok(filtered[start..].iter().map(|e| (*e).clone()).collect())
    }

    pub async fn cancel(&self, job_id: &str, force: bool) -> Result<CancelOutcome, CoreError> {
        let record = self.get_record(job_id).await?;
        let mut job = record.lock().await;
        if job.status != JobStatus::Running {
            return Ok(CancelOutcome { success: false });
        }
        job.cancel_requested = true;
        if let Some(child) = job.child.as_mut() {
            if force {
                let _ = child.start_kill();
            } else {
                match child.id() {
                    Some(pid) => {
                        // SAFETY: pid is a live child PID owned by this
                        // process; SIGTERM lets the agent flush and exit on
                        // its own terms.
                        unsafe {
                            libc::kill(pid as libc::pid_t, libc::SIGTERM);
                        }
                    }
                    None => {
                        let _ = child.start_kill();
                    }
                }
            }
        }
        Ok(CancelOutcome { success: true })
    }

    pub async fn wait_for_exit(&self, job_id: &str, wait_ms: u64) -> Result<WaitForExitOutcome, CoreError> {
        let record = self.get_record(job_id).await?;
        let (already_terminal, mut rx) = {
            let job = record.lock().await;
            (job.status != JobStatus::Running, job.completion_rx())
        };
        if already_terminal {
            return Ok(WaitForExitOutcome { exited: true });
        }
        if wait_ms == 0 {
            return Ok(WaitForExitOutcome { exited: false });
        }

        let exited = tokio::time::timeout(Duration::from_millis(wait_ms), async {
            loop {
                if *rx.borrow() {
                    return;
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
        .is_ok();

        Ok(WaitForExitOutcome { exited })
    }

    pub async fn wait_any(&self, job_ids: &[String], timeout_ms: u64) -> WaitAnyOutcome {
        let mut known = Vec::new();
        let mut missing = Vec::new();
        {
            let jobs = self.jobs.read().await;
            for id in job_ids {
                match jobs.get(id) {
                    Some(rec) => known.push((id.clone(), rec.clone())),
                    None => missing.push(id.clone()),
                }
            }
        }

        if known.is_empty() {
            return WaitAnyOutcome {
                completed_job_id: None,
                timed_out: false,
                missing_job_ids: missing,
            };
        }

        let mut receivers = Vec::with_capacity(known.len());
        for (id, rec) in &known {
            let job = rec.lock().await;
            if job.status != JobStatus::Running {
                return WaitAnyOutcome {
                    completed_job_id: Some(id.clone()),
                    timed_out: false,
                    missing_job_ids: missing,
                };
            }
            receivers.push((id.clone(), job.completion_rx()));
        }

        let wait_future = async move {
            let futs = receivers.into_iter().map(|(id, mut rx)| {
                Box::pin(async move {
                    let _ = rx.changed().await;
                    id
                })
            });
            let (winner, _idx, _rest) = futures::future::select_all(futs).await;
            winner
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), wait_future).await {
            Ok(id) => WaitAnyOutcome {
                completed_job_id: Some(id),
                timed_out: false,
                missing_job_ids: missing,
            },
            Err(_) => WaitAnyOutcome {
                completed_job_id: None,
                timed_out: true,
                missing_job_ids: missing,
            },
        }
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn parse_cursor(cursor: Option<&str>) -> usize {
    let s = match cursor {
        Some(s) if !s.is_empty() => s,
        _ => return 0,
    };
    if let Ok(v) = s.parse::<i64>() {
        return v.max(0) as usize;
    }
    if let Ok(v) = s.parse::<f64>() {
        if v.is_finite() {
            return v.max(0.0) as usize;
        }
    }
    0
}

fn final_message_for(job: &JobRecord) -> String {
    if let Some(msg) = &job.last_agent_message {
        return msg.clone();
    }
    let exit_suffix = job
        .exit_code
        .map(|c| format!(" (exit code {c})"))
        .unwrap_or_default();
    match job.status {
        JobStatus::Running => String::new(),
        JobStatus::Done => format!("The subagent job completed successfully{exit_suffix}."),
        JobStatus::Failed => format!("The subagent job failed{exit_suffix}."),
        JobStatus::Canceled => format!("The subagent job was canceled{exit_suffix}."),
    }
}

/// `exec --json` plus the resolved flags, in the fixed order the agent
/// expects, ending with the prompt as the sole positional argument. Built as
/// a plain `Vec<String>` handed to `tokio::process::Command::args`, which
/// never re-interprets it through a shell.
fn build_argv(effective: &EffectiveOptions, prompt: &str) -> Vec<String> {
    let mut args = vec!["exec".to_string(), "--json".to_string()];

    if let Some(model) = &effective.model {
        args.push("--model".to_string());
        args.push(model.clone());
    }
    if let Some(effort) = effective.reasoning_effort {
        args.push("-c".to_string());
        args.push(format!("model_reasoning_effort=\"{effort}\""));
    }
    if let Some(sandbox) = effective.sandbox {
        args.push("--sandbox".to_string());
        args.push(sandbox.to_string());
    }
    if effective.use_full_auto {
        args.push("--full-auto".to_string());
    }
    if let Some(dir) = &effective.working_directory {
        args.push("-C".to_string());
        args.push(dir.clone());
    }
    args.push("--skip-git-repo-check".to_string());
    args.push(prompt.to_string());
    args
}

fn spawn_stream_reader(
    record: Arc<Mutex<JobRecord>>,
    mut reader: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
) {
    tokio::spawn(async move {
        let mut framer = LineFramer::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let chunk = &buf[..n];

            {
                let mut job = record.lock().await;
                match kind {
                    StreamKind::Stdout => job.stdout_tail.append(chunk),
                    StreamKind::Stderr => job.stderr_tail.append(chunk),
                }
            }

            if matches!(kind, StreamKind::Stdout) {
                let lines = framer.push(chunk);
                if !lines.is_empty() {
                    let mut job = record.lock().await;
                    for line in &lines {
                        ingest_stdout_line(&mut job, line);
                    }
                }
            }
        }

        if matches!(kind, StreamKind::Stdout) {
            if let Some(line) = framer.flush() {
                let mut job = record.lock().await;
                ingest_stdout_line(&mut job, &line);
            }
        }
    });
}

fn ingest_stdout_line(job: &mut JobRecord, line: &str) {
    match serde_json::from_str::<Value>(line) {
        Ok(raw) => {
            if let Some(ev) = normalize(&raw) {
                match ev.event_type {
                    EventType::Message => {
                        if let Some(text) = ev.content.get("text").and_then(Value::as_str) {
                            job.last_agent_message = Some(text.to_string());
                        }
                    }
                    EventType::Progress => {
                        if ev.content.get("kind").and_then(Value::as_str) == Some("turn.completed") {
                            job.turn_completed = true;
                        }
                    }
                    _ => {}
                }
                job.events.push_back(ev);
            }
        }
        Err(e) => {
            debug!(job_id = %job.job_id, %line, error = %e, "malformed agent event line");
            job.events.push_back(NormalizedEvent::new(
                EventType::Error,
                json!({
                    "message": "Failed to parse codex JSONL event",
                    "line": line,
                    "error": e.to_string(),
                }),
            ));
        }
    }
}

fn spawn_waiter(record: Arc<Mutex<JobRecord>>) {
    tokio::spawn(async move {
        let child = {
            let mut job = record.lock().await;
            job.child.take()
        };
        let Some(mut child) = child else { return };

        let outcome = child.wait().await;
        let mut job = record.lock().await;
        let finished_at = now_iso8601();

        match outcome {
            Ok(exit_status) => {
                let exit_code = exit_status.code();
                #[cfg(unix)]
                let exit_signal = {
                    use std::os::unix::process::ExitStatusExt;
                    exit_status.signal()
                };
                #[cfg(not(unix))]
                let exit_signal: Option<i32> = None;

                let status = classify_termination(job.cancel_requested, job.turn_completed, exit_code);

                job.status = status;
                job.finished_at = Some(finished_at);
                job.exit_code = exit_code;
                job.exit_signal = exit_signal;

                let job_id = job.job_id.clone();
                let last_message = job.last_agent_message.clone();
                job.events.push_back(NormalizedEvent::new(
                    EventType::Final,
                    json!({
                        "jobId": job_id,
                        "status": status,
                        "exitCode": exit_code,
                        "exitSignal": exit_signal,
                        "lastMessage": last_message,
                    }),
                ));
            }
            Err(e) => {
                let status = if job.cancel_requested {
                    JobStatus::Canceled
                } else {
                    JobStatus::Failed
                };
                job.status = status;
                job.finished_at = Some(finished_at);
                job.events.push_back(NormalizedEvent::new(
                    EventType::Error,
                    json!({ "message": format!("waiting on child failed: {e}") }),
                ));
            }
        }

        job.fire_completion();
    });
}

/// I4/I5: cancellation wins regardless of exit code whenever requested and
/// the agent never reported finishing its turn on its own; otherwise exit
/// code alone decides `done` vs `failed`.
fn classify_termination(cancel_requested: bool, turn_completed: bool, exit_code: Option<i32>) -> JobStatus {
    if cancel_requested && !turn_completed {
        JobStatus::Canceled
    } else if exit_code == Some(0) {
        JobStatus::Done
    } else {
        JobStatus::Failed
    }
}
