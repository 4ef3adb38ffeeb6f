//! Minimal stderr logger behind the `log` facade.
//!
//! Lines are `LEVEL target: message` with the level painted by `ansi_term`. The CPU trace is
//! emitted at trace level, so it only costs a formatted string when the level allows it.

use ansi_term::Colour::{Blue, Green, Purple, Red, Yellow};
use ansi_term::{ANSIGenericString, Style};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct Logger {
    level: LevelFilter,
}

fn paint(level: Level) -> ANSIGenericString<'static, str> {
    let style: Style = match level {
        Level::Error => Red.bold(),
        Level::Warn => Yellow.bold(),
        Level::Info => Green.bold(),
        Level::Debug => Blue.normal(),
        Level::Trace => Purple.normal(),
    };
    style.paint(level.as_str())
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{} {}: {}", paint(record.level()), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Install the logger. Fails if another logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(Logger { level }))?;
    log::set_max_level(level);
    Ok(())
}
