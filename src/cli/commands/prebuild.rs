//! Prebuild command - build or reuse the prebuild image

use crate::cli::args::PrebuildArgs;
use crate::config::{Config, ConfigManager};
use crate::error::PrebakeResult;
use crate::orchestration::DevcontainerCli;
use crate::prebuild::{Outcome, Prebuilder};
use crate::ui::{self, BuildProgress, Mark, UiContext};
use std::path::Path;

/// Execute the prebuild command
pub async fn execute(args: PrebuildArgs, config_path: &Path, config: &Config) -> PrebakeResult<Outcome> {
    let ctx = UiContext::detect();
    let builder = DevcontainerCli::new(&config.prebuild);

    let progress = BuildProgress::new(&ctx, "prebuild image");
    let on_output = |line: String| progress.on_line(line);

    let prebuilder = Prebuilder::new(
        config_path,
        &config.prebuild,
        &builder,
        ConfigManager::state_dir(),
    )
    .with_output(&on_output);

    let result = prebuilder.prebuild(args.force, args.dry_run).await;
    progress.finish();

    let outcome = result?;
    if let Some(message) = &outcome.message {
        let mark = if args.dry_run { Mark::Info } else { Mark::Done };
        ui::line(&ctx, mark, message);
    }
    Ok(outcome)
}
