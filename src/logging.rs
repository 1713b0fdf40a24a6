use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// Writes diagnostics to stderr, tagged with the shell's pid.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "{}",
            format_record(std::process::id(), record)
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn format_record(pid: u32, record: &Record) -> String {
    format!(
        "tinysh[{}] {} {}: {}",
        pid,
        record.level(),
        record.target(),
        record.args()
    )
}

/// Installs the stderr logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
