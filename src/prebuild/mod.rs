//! Prebuild lifecycle
//!
//! - `engine`: `Prebuilder`, the prebuild/restore/status state machine
//! - `state`: the explicit `PrebuildState` and operation `Outcome`
//! - `lock`: per-project advisory lock

mod engine;
mod lock;
mod state;

pub use engine::Prebuilder;
pub use lock::ProjectLock;
pub use state::{Outcome, PrebuildState};
