use log::{Level, LevelFilter, Log, Metadata, Record};
use pdsim_core::ProcessContext;

/// Writes log records to stderr on the coordinating rank only
pub struct RankLog {
    context: ProcessContext,
    level: LevelFilter,
}

impl RankLog {
    /// Install as the global logger; `verbosity` counts `-v` flags
    pub fn init(context: ProcessContext, verbosity: u8) -> Result<(), log::SetLoggerError> {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        log::set_boxed_logger(Box::new(RankLog { context, level }))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for RankLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.context.is_coordinator() && metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let label = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("[{}] {}: {}", label, record.target(), record.args());
    }

    fn flush(&self) {}
}
