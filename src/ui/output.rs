//! Result lines and reports printed by the commands

use super::context::UiContext;
use console::style;

/// Marker on a single result line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Info,
    Warn,
}

impl Mark {
    fn tag(self) -> String {
        match self {
            Mark::Done => style("[OK]").green().to_string(),
            Mark::Info => style("[INFO]").cyan().to_string(),
            Mark::Warn => style("[WARN]").yellow().to_string(),
        }
    }
}

/// Print one result line
pub fn line(ctx: &UiContext, mark: Mark, message: &str) {
    if !ctx.use_fancy_output() {
        println!("{} {}", mark.tag(), message);
        return;
    }

    let _ = match mark {
        Mark::Done => cliclack::log::success(message),
        Mark::Info => cliclack::log::info(message),
        Mark::Warn => cliclack::log::warning(message),
    };
}

/// Print a report whose first line is its title.
///
/// Single-line reports degrade to an info line.
pub fn report(ctx: &UiContext, text: &str) {
    let Some((title, body)) = text.split_once('\n') else {
        line(ctx, Mark::Info, text);
        return;
    };

    if ctx.use_fancy_output() {
        let _ = cliclack::note(title, body);
    } else {
        println!("{}", style(title).bold());
        for row in body.lines() {
            println!("  {}", row.trim_start());
        }
    }
}

/// Print a titled list of `key: value` rows
pub fn table<K, V>(ctx: &UiContext, title: &str, rows: impl IntoIterator<Item = (K, V)>)
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    println!("{}", style(title).bold());
    for (key, value) in rows {
        if ctx.use_fancy_output() {
            println!("  {}: {}", style(key).dim(), value);
        } else {
            println!("  {}: {}", key, value);
        }
    }
}
