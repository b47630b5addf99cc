//! Console logger: `env_logger` with severity-tagged lines on stdout.
//!
//! Records logged with target [`SUCCESS_TARGET`] are tagged `[SUCCESS]`;
//! everything else is tagged with its level, e.g. `[INFO]` or `[ERROR]`.
use std::io::Write;

use colored::{ColoredString, Colorize};
use env_logger::WriteStyle;
use log::{Level, LevelFilter};

/// Log target marking a completed check or step.
pub const SUCCESS_TARGET: &str = "success";

pub fn tag(level: Level, target: &str) -> &'static str {
    if target == SUCCESS_TARGET && level == Level::Info {
        return "[SUCCESS]";
    }
    match level {
        Level::Error => "[ERROR]",
        Level::Warn => "[WARN]",
        Level::Info => "[INFO]",
        Level::Debug => "[DEBUG]",
        Level::Trace => "[TRACE]",
    }
}

fn colored_tag(level: Level, target: &str) -> ColoredString {
    let t = tag(level, target);
    match t {
        "[SUCCESS]" => t.green().bold(),
        "[ERROR]" => t.red().bold(),
        "[WARN]" => t.yellow(),
        "[INFO]" => t.cyan(),
        _ => t.dimmed(),
    }
}

pub fn init(level: LevelFilter, style: WriteStyle) {
    // RUST_LOG is parsed after the CLI level so it can override it.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .write_style(style)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {}",
                colored_tag(record.level(), record.target()),
                record.args()
            )
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_target_gets_its_own_tag() {
        assert_eq!(tag(Level::Info, SUCCESS_TARGET), "[SUCCESS]");
        assert_eq!(tag(Level::Info, "adexport::engine"), "[INFO]");
        assert_eq!(tag(Level::Error, SUCCESS_TARGET), "[ERROR]");
    }
}
