//! Build progress with CI fallback

use super::context::UiContext;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::OnceLock;

/// Progress bar for prebuild image builds.
///
/// Understands BuildKit `#N [stage K/M] INSTRUCTION` lines and Podman
/// `STEP K/M: INSTRUCTION` lines. Nothing is shown until the builder
/// produces its first line, so cache hits stay silent.
pub struct BuildProgress {
    label: String,
    fancy: bool,
    bar: OnceLock<Option<ProgressBar>>,
}

impl BuildProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        Self {
            label: label.to_string(),
            fancy: ctx.use_fancy_output(),
            bar: OnceLock::new(),
        }
    }

    fn bar(&self) -> Option<&ProgressBar> {
        self.bar.get_or_init(|| self.start()).as_ref()
    }

    fn start(&self) -> Option<ProgressBar> {
        if !self.fancy {
            println!("Building {}...", self.label);
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("  {spinner:.yellow} Building {prefix}  {bar:20.yellow/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .progress_chars("━╸─");

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix(self.label.clone());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(bar)
    }

    /// Process a builder output line
    pub fn on_line(&self, line: String) {
        let bar = self.bar();

        if let Some((n, total, instruction)) = parse_step_line(&line) {
            match bar {
                Some(bar) => {
                    bar.set_length(total);
                    bar.set_position(n);
                    bar.set_message(instruction.to_string());
                }
                None => println!("  [{}/{}] {}", n, total, instruction),
            }
        } else if let Some(bar) = bar {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !is_build_noise(trimmed) {
                let display: String = if trimmed.chars().count() > 60 {
                    format!("{}...", trimmed.chars().take(57).collect::<String>())
                } else {
                    trimmed.to_string()
                };
                bar.set_message(display);
            }
        }
    }

    /// Finish and clear the progress bar, if it was ever shown
    pub fn finish(&self) {
        if let Some(Some(bar)) = self.bar.get() {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// BuildKit bookkeeping lines that aren't useful to display
fn is_build_noise(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('#') else {
        return line.starts_with("-->") || line.starts_with("COMMIT");
    };
    let detail = rest
        .split_once(' ')
        .map(|(_, detail)| detail.trim())
        .unwrap_or_default();

    detail.starts_with("DONE")
        || detail.starts_with("CACHED")
        || detail.starts_with("sha256:")
        || detail.starts_with("writing ")
        || detail.starts_with("exporting ")
}

/// Parse a build step line into `(step, total, instruction)`
fn parse_step_line(line: &str) -> Option<(u64, u64, &str)> {
    if let Some(rest) = line.strip_prefix("STEP ") {
        let (counter, instruction) = rest.split_once(':')?;
        let (n, total) = parse_counter(counter)?;
        return Some((n, total, instruction.trim()));
    }

    // #7 [dev_containers_target_stage 2/4] RUN ...
    let open = line.find('[')?;
    let close = open + line[open..].find(']')?;
    let counter = line[open + 1..close].rsplit(' ').next()?;
    let (n, total) = parse_counter(counter)?;
    let instruction = line[close + 1..].trim();
    if instruction.is_empty() {
        return None;
    }
    Some((n, total, instruction))
}

fn parse_counter(counter: &str) -> Option<(u64, u64)> {
    let (n, total) = counter.trim().split_once('/')?;
    Some((n.parse().ok()?, total.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_buildkit_step() {
        let (n, m, instr) =
            parse_step_line("#8 [dev_containers_target_stage 3/4] RUN /tmp/build-features/install.sh")
                .unwrap();
        assert_eq!((n, m), (3, 4));
        assert_eq!(instr, "RUN /tmp/build-features/install.sh");

        let (n, m, instr) = parse_step_line("#5 [1/2] FROM docker.io/library/base:1.0").unwrap();
        assert_eq!((n, m), (1, 2));
        assert_eq!(instr, "FROM docker.io/library/base:1.0");
    }

    #[test]
    fn parse_podman_step() {
        let (n, m, instr) = parse_step_line("STEP 1/8: FROM base:1.0").unwrap();
        assert_eq!((n, m), (1, 8));
        assert_eq!(instr, "FROM base:1.0");
    }

    #[test]
    fn parse_step_line_not_a_step() {
        assert!(parse_step_line("#3 [internal] load metadata for docker.io/library/base:1.0").is_none());
        assert!(parse_step_line("#5 DONE 0.3s").is_none());
        assert!(parse_step_line("[2025-01-01T00:00:00.000Z] Start: Run: docker buildx build").is_none());
        assert!(parse_step_line("").is_none());
    }

    #[test]
    fn noise_filter() {
        assert!(is_build_noise("#5 DONE 0.3s"));
        assert!(is_build_noise("#6 CACHED"));
        assert!(is_build_noise("#9 writing image sha256:abc done"));
        assert!(is_build_noise("--> Using cache abc123"));
        assert!(!is_build_noise("#8 0.512 Installing node 20"));
        assert!(!is_build_noise("Resolving feature dependencies..."));
    }

    #[test]
    fn build_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = BuildProgress::new(&ctx, "prebake/base:1.0");
        progress.finish();
        progress.on_line("#5 [1/2] FROM docker.io/library/base:1.0".to_string());
        progress.on_line("#5 DONE 0.1s".to_string());
        progress.finish();
        // Should not panic
    }
}
