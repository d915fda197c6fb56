use log::{Level, LevelFilter, Log, Metadata, Record};
use std::{io::Write, sync::OnceLock, time::Instant};

struct Logger {
    start: OnceLock<Instant>,
}

static LOGGER: Logger = Logger { start: OnceLock::new() };

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.start.get_or_init(Instant::now).elapsed();
        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        // stderr can go away when the terminal closes; nothing useful to do about it
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:>9.3}] {} {}: {}",
            elapsed.as_secs_f64(),
            tag,
            record.target(),
            record.args()
        );
    }

    fn flush(&self) { let _ = std::io::stderr().flush(); }
}

/// Installs the stderr logger. Calling it twice keeps the first logger but
/// still applies the new level.
pub fn init(verbose: bool) {
    LOGGER.start.get_or_init(Instant::now);
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
}
