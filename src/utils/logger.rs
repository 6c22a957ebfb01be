/*
 * Kernel Logging System
 *
 * `log` backend for the byte device and its host glue. Records are
 * formatted as "[LEVEL] message" into a fixed-size line buffer (no heap
 * allocation while logging) and handed to a sink the host installs,
 * normally its serial console writer.
 *
 * Lines longer than LINE_MAX are cut at the last piece that still fits.
 */

use core::fmt::Write;

use heapless::String;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Once;

/// Longest line handed to the sink
pub const LINE_MAX: usize = 256;

/// Output function for formatted lines
pub type LogSink = fn(&str);

/// Custom logger implementation for the byte device.
struct BytedevLogger {
    sink: Once<LogSink>,
}

impl log::Log for BytedevLogger {
    /// Checks if the given log level is enabled.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Formats the record and passes it to the sink.
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.get() {
            sink(format_line(record).as_str());
        }
    }

    /// Flushes the logger (no-op in this case).
    fn flush(&self) {}
}

/// The logger instance used for logging.
static LOGGER: BytedevLogger = BytedevLogger { sink: Once::new() };

/// Installs the logger with `sink` as output and `level` as max level.
///
/// Fails if another logger is already installed.
pub fn init(level: LevelFilter, sink: LogSink) -> Result<(), SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Format a record into one line
pub fn format_line(record: &Record) -> String<LINE_MAX> {
    let mut line = String::new();
    // overflow just truncates the line
    let _ = write!(line, "[{}] {}", record.level(), record.args());
    line
}
