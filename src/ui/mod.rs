//! Terminal output for the prebake CLI
//!
//! Uses `cliclack` for styled log lines and `indicatif` for build progress,
//! with automatic fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use prebake::ui::{self, BuildProgress, Mark, UiContext};
//!
//! let ctx = UiContext::detect();
//! let progress = BuildProgress::new(&ctx, "prebake/base:1.0");
//! // ... feed builder output to progress.on_line ...
//! progress.finish();
//!
//! ui::line(&ctx, Mark::Done, "Prebuild complete");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{line, report, table, Mark};
pub use progress::BuildProgress;
