//! Ports command - stable port assignment for forwarded services

use crate::cli::args::{PortsAction, PortsArgs};
use crate::config::{Config, ConfigManager};
use crate::error::PrebakeResult;
use crate::ports::{PortAllocator, TcpBindProbe};
use crate::ui::{self, Mark, UiContext};

/// Execute the ports command
pub async fn execute(args: PortsArgs, config: &Config) -> PrebakeResult<()> {
    let ctx = UiContext::detect();
    let mut allocator =
        PortAllocator::load(&ConfigManager::ports_path(), &config.ports, Box::new(TcpBindProbe)).await;

    match args.action {
        PortsAction::Allocate { labels } => {
            for label in &labels {
                let assignment = allocator.allocate(label).await?;
                ui::line(
                    &ctx,
                    Mark::Done,
                    &format!(
                        "{} -> {} (since {})",
                        assignment.label,
                        assignment.port,
                        assignment.assigned_at.format("%Y-%m-%d %H:%M")
                    ),
                );
            }
            allocator.save().await?;
        }
        PortsAction::List => {
            let assignments = allocator.get_allocations();
            if assignments.is_empty() {
                ui::line(&ctx, Mark::Info, "No ports assigned");
                return Ok(());
            }

            ui::table(
                &ctx,
                "Assigned ports",
                assignments.iter().map(|(label, a)| (label, a.port)),
            );
        }
    }

    Ok(())
}
