// SPDX-License-Identifier: MIT
mod cancel;
mod common;
mod events;
mod interrupt;
mod result;
mod run;
mod spawn;
mod spawn_group;
mod spawn_metadata;
mod status;
mod wait_any;

pub use cancel::CancelTool;
pub use events::EventsTool;
pub use interrupt::InterruptTool;
pub use result::ResultTool;
pub use run::RunTool;
pub use spawn::SpawnTool;
pub use spawn_group::SpawnGroupTool;
pub use spawn_metadata::GetSpawnMetadataTool;
pub use status::StatusTool;
pub use wait_any::WaitAnyTool;
