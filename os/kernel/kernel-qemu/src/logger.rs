use crate::qemu_fmt::QemuSink;
use core::fmt::{self, Write};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log` backend for the QEMU debug console.
///
/// Filtering is left to `log::max_level`, which [`init`] sets.
pub struct QemuLogger;

static LOGGER: QemuLogger = QemuLogger;

/// Installs [`QemuLogger`] as the global logger and sets the maximum level.
///
/// # Errors
/// Fails if a logger was already installed.
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}

impl QemuLogger {
    /// Writes `record` as a single `"[LEVEL] target: message\n"` line.
    ///
    /// # Errors
    /// Propagates errors from `out`.
    pub fn write_record<O: Write>(out: &mut O, record: &Record) -> fmt::Result {
        writeln!(out, "[{}] {}: {}", record.level(), record.target(), record.args())
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = Self::write_record(&mut QemuSink, record);
    }

    fn flush(&self) {}
}
