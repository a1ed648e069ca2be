//! Status command - show the project's prebuild state

use crate::config::{Config, ConfigManager};
use crate::error::PrebakeResult;
use crate::orchestration::DevcontainerCli;
use crate::prebuild::{Outcome, Prebuilder};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the status command
pub async fn execute(config_path: &Path, config: &Config) -> PrebakeResult<Outcome> {
    let ctx = UiContext::detect();
    let builder = DevcontainerCli::new(&config.prebuild);
    let prebuilder = Prebuilder::new(
        config_path,
        &config.prebuild,
        &builder,
        ConfigManager::state_dir(),
    );

    let outcome = prebuilder.status().await?;
    ui::report(&ctx, outcome.text());
    Ok(outcome)
}
