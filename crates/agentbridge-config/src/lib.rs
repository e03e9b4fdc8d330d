// SPDX-License-Identifier: Apache-2.0
mod env;
mod loader;
mod schema;

pub use env::{concurrency_cap, default_sandbox, DEFAULT_CONCURRENCY_CAP};
pub use loader::load;
pub use schema::*;
