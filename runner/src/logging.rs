use std::error::Error;

use flexi_logger::{style, DeferredNow, Logger, LoggerHandle, Record, TS_DASHES_BLANK_COLONS_DOT_BLANK};

fn log_format(w: &mut dyn std::io::Write, now: &mut DeferredNow, record: &Record) -> Result<(), std::io::Error> {
  let level = record.level();
  write!(
    w,
    "[{}] {} [{}:{}] {}",
    style(level).paint(now.format(TS_DASHES_BLANK_COLONS_DOT_BLANK).to_string()),
    style(level).paint(level.to_string()),
    record.file().unwrap_or("<unnamed>"),
    record.line().unwrap_or(0),
    style(level).paint(&record.args().to_string())
  )
}

/// Logs to stderr so stdout stays free for `--trace`. `RUST_LOG` overrides the level.
pub fn init() -> Result<LoggerHandle, Box<dyn Error>> {
  let handle = Logger::try_with_env_or_str("info")?.format(log_format).start()?;
  Ok(handle)
}
