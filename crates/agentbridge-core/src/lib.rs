// SPDX-License-Identifier: MIT
mod error;
mod event;
mod interrupt;
mod job;
mod line_framer;
mod manager;
mod tail_buffer;

pub use error::CoreError;
pub use event::{normalize, EventType, NormalizedEvent};
pub use interrupt::{InterruptCoordinator, InterruptOutcome, InterruptRequest};
pub use job::{
    overlay_overrides, resolve_effective_options, EffectiveOptions, EffectiveOverrides, SpawnMetadata,
    SpawnRequest,
};
pub use job::JobStatus;
pub use line_framer::LineFramer;
pub use manager::{
    CancelOutcome, EventsPage, FullResult, JobManager, ResultOutput, ResultView, SpawnOutcome, StatusView,
    WaitAnyOutcome, WaitForExitOutcome,
};
pub use tail_buffer::{TailBuffer, TAIL_BUFFER_CAP_BYTES};
