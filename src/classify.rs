// src/classify.rs
//! Entry classifier: decides which certificate(s) of a decoded entry are
//! persisted, under the `include_precerts` / `include_chain` options.

use std::sync::Arc;

use crate::leaf::{DecodedEntry, EntryKind};
use crate::run_log::RunLog;
use crate::sink::CertSink;

#[derive(Clone)]
pub struct EntryRouter {
    sink: Arc<CertSink>,
    run_log: RunLog,
    include_precerts: bool,
    include_chain: bool,
}

impl EntryRouter {
    pub fn new(
        sink: Arc<CertSink>,
        run_log: RunLog,
        include_precerts: bool,
        include_chain: bool,
    ) -> Self {
        Self {
            sink,
            run_log,
            include_precerts,
            include_chain,
        }
    }

    /// Dispatch one decoded entry to the sink. Each certificate is an
    /// independent sink call; chain output does not depend on whether the
    /// primary payload was emitted.
    pub fn route(&self, entry: &DecodedEntry) {
        let timestamp_key = entry.timestamp_key();

        match entry.kind {
            EntryKind::X509 => {
                self.sink.write(&entry.cert, &timestamp_key);
            }
            EntryKind::Precert => {
                if self.include_precerts {
                    self.sink.write(&entry.cert, &timestamp_key);
                }
            }
            EntryKind::Unknown(tag) => {
                self.run_log.line(format!(
                    "Unhandled log entry type {} at index {}",
                    tag, entry.index
                ));
            }
        }

        if self.include_chain {
            for cert in &entry.chain {
                self.sink.write(cert, &timestamp_key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsCollector;
    use std::path::Path;
    use tempfile::tempdir;

    fn entry(kind: EntryKind, chain_len: usize) -> DecodedEntry {
        DecodedEntry {
            index: 42,
            kind,
            timestamp: 1_700_000_000_000,
            cert: match kind {
                EntryKind::Unknown(_) => Vec::new(),
                _ => b"primary-der".to_vec(),
            },
            chain: (0..chain_len).map(|i| vec![i as u8; 8]).collect(),
        }
    }

    fn router(dir: &Path, precerts: bool, chain: bool) -> (EntryRouter, std::path::PathBuf) {
        let sink = Arc::new(
            CertSink::new(dir.to_path_buf(), false, None, StatsCollector::new()).unwrap(),
        );
        let log_path = dir.join("run.log");
        let run_log = RunLog::create(&log_path).unwrap();
        (EntryRouter::new(sink, run_log, precerts, chain), log_path)
    }

    fn artifact_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".pem")
            })
            .count()
    }

    #[test]
    fn test_x509_emits_primary() {
        let dir = tempdir().unwrap();
        let (router, _) = router(dir.path(), false, false);

        router.route(&entry(EntryKind::X509, 2));
        assert_eq!(artifact_count(dir.path()), 1);
    }

    #[test]
    fn test_precert_suppressed_by_default_but_chain_still_emitted() {
        let dir = tempdir().unwrap();
        let (router, _) = router(dir.path(), false, true);

        router.route(&entry(EntryKind::Precert, 3));
        // No primary, three chain certificates
        assert_eq!(artifact_count(dir.path()), 3);
    }

    #[test]
    fn test_precert_emitted_when_enabled() {
        let dir = tempdir().unwrap();
        let (router, _) = router(dir.path(), true, false);

        router.route(&entry(EntryKind::Precert, 3));
        assert_eq!(artifact_count(dir.path()), 1);
    }

    #[test]
    fn test_chain_emitted_with_x509_primary() {
        let dir = tempdir().unwrap();
        let (router, _) = router(dir.path(), false, true);

        router.route(&entry(EntryKind::X509, 2));
        assert_eq!(artifact_count(dir.path()), 3);
    }

    #[test]
    fn test_unknown_type_logged_not_emitted() {
        let dir = tempdir().unwrap();
        let (router, log_path) = router(dir.path(), true, true);

        router.route(&entry(EntryKind::Unknown(9), 0));

        assert_eq!(artifact_count(dir.path()), 0);
        let log = std::fs::read_to_string(log_path).unwrap();
        assert!(log.contains("Unhandled log entry type 9"));
        assert!(log.contains("index 42"));
    }
}
