//! Restore command - put the original base image back

use crate::cli::args::RestoreArgs;
use crate::config::{Config, ConfigManager};
use crate::error::PrebakeResult;
use crate::orchestration::DevcontainerCli;
use crate::prebuild::{Outcome, Prebuilder};
use crate::ui::{self, Mark, UiContext};
use std::path::Path;

/// Execute the restore command
pub async fn execute(args: RestoreArgs, config_path: &Path, config: &Config) -> PrebakeResult<Outcome> {
    let ctx = UiContext::detect();
    let builder = DevcontainerCli::new(&config.prebuild);
    let prebuilder = Prebuilder::new(
        config_path,
        &config.prebuild,
        &builder,
        ConfigManager::state_dir(),
    );

    let outcome = prebuilder.restore(args.purge).await?;
    if let Some(message) = &outcome.message {
        ui::line(&ctx, Mark::Done, message);
    }
    Ok(outcome)
}
