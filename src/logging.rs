//! File-backed `log` sink. The terminal belongs to the UI, so records go to a file.

use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        if let Ok(mut file) = self.file.lock() {
            // Nowhere left to report a failed log write.
            let _ = writeln!(
                file,
                "{}.{:03} {:<5} {}: {}",
                stamp.as_secs(),
                stamp.subsec_millis(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Append log records at or above `level` to `path`.
pub fn init(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    log::set_boxed_logger(Box::new(FileLogger {
        level,
        file: Mutex::new(file),
    }))?;
    log::set_max_level(level);
    Ok(())
}
