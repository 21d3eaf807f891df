// src/run_log.rs
//! Append-only run log shared by every worker.
//!
//! The run log is the durable record of the whole run: per-log errors,
//! exhaustion notes, and completion summaries. Appends from different
//! workers may interleave in any order, but each line is written whole
//! under the lock.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub struct RunLog {
    file: Arc<Mutex<File>>,
}

impl RunLog {
    /// Create (truncate) the run log file. An unwritable run log is a
    /// fatal startup error.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create run log at {}", path.display()))?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Append one line. Write failures are logged and swallowed so a full
    /// disk cannot take a worker down mid-sample.
    pub fn line(&self, msg: impl AsRef<str>) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = writeln!(file, "{}", msg.as_ref()) {
            warn!("Failed to append to run log: {}", e);
            return;
        }
        if let Err(e) = file.flush() {
            warn!("Failed to flush run log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lines_appended_in_order_within_one_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");

        let log = RunLog::create(&path).unwrap();
        log.line("first");
        log.line("second");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = RunLog::create(&path).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        log.line(format!("writer-{i} line-{j}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 400);
        for line in lines {
            assert!(line.starts_with("writer-"), "corrupted line: {line}");
        }
    }

    #[test]
    fn test_create_fails_for_bad_path() {
        assert!(RunLog::create(Path::new("/nonexistent/dir/run.log")).is_err());
    }
}
