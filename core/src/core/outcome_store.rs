use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::core::Verdict;
use crate::utils::{ensure_parent_dir, read_lines};

/// Append-only membership lists, one file per verdict.
///
/// Single-process, single-writer: every `record` is one `write_all` of a
/// full line followed by a flush, so lines never interleave as long as
/// callers stay sequential.
#[derive(Debug, Clone)]
pub struct OutcomeStore {
    vulnerable: PathBuf,
    not_exploitable: PathBuf,
}

impl OutcomeStore {
    pub fn new(vulnerable: impl Into<PathBuf>, not_exploitable: impl Into<PathBuf>) -> Self {
        Self {
            vulnerable: vulnerable.into(),
            not_exploitable: not_exploitable.into(),
        }
    }

    pub fn path(&self, verdict: Verdict) -> &Path {
        match verdict {
            Verdict::Vulnerable => &self.vulnerable,
            Verdict::NotExploitable => &self.not_exploitable,
        }
    }

    /// Appends `target` to the list for `verdict` and flushes before returning.
    pub fn record(&self, target: &str, verdict: Verdict) -> io::Result<()> {
        let path = self.path(verdict);
        ensure_parent_dir(path)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format!("{}\n", target).as_bytes())?;
        file.flush()?;
        debug!("recorded {} as {} in {}", target, verdict, path.display());
        Ok(())
    }

    /// Truncates the list for `verdict` to zero length, creating it if needed.
    pub fn reset(&self, verdict: Verdict) -> io::Result<()> {
        let path = self.path(verdict);
        ensure_parent_dir(path)?;
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(())
    }

    pub fn reset_all(&self) -> io::Result<()> {
        self.reset(Verdict::Vulnerable)?;
        self.reset(Verdict::NotExploitable)
    }

    /// Reads a list back for reporting. A list that was never written is empty.
    pub fn read(&self, verdict: Verdict) -> io::Result<Vec<String>> {
        match read_lines(self.path(verdict)) {
            Ok(lines) => Ok(lines),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(dir: &Path) -> OutcomeStore {
        OutcomeStore::new(
            dir.join("results/vulnerable.txt"),
            dir.join("results/not_exploitable.txt"),
        )
    }

    #[test]
    fn test_record_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(dir.path());

        store.record("http://a.com/", Verdict::Vulnerable).unwrap();
        store.record("http://b.com/", Verdict::Vulnerable).unwrap();
        store.record("http://c.com/", Verdict::NotExploitable).unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path(Verdict::Vulnerable)).unwrap(),
            "http://a.com/\nhttp://b.com/\n"
        );
        assert_eq!(store.read(Verdict::NotExploitable).unwrap(), vec!["http://c.com/"]);
    }

    #[test]
    fn test_record_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(dir.path());
        store.record("http://old.com/", Verdict::NotExploitable).unwrap();

        let reopened = temp_store(dir.path());
        reopened.record("http://new.com/", Verdict::NotExploitable).unwrap();

        assert_eq!(
            reopened.read(Verdict::NotExploitable).unwrap(),
            vec!["http://old.com/", "http://new.com/"]
        );
    }

    #[test]
    fn test_reset_truncates_only_one_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(dir.path());
        store.record("http://a.com/", Verdict::Vulnerable).unwrap();
        store.record("http://b.com/", Verdict::NotExploitable).unwrap();

        store.reset(Verdict::Vulnerable).unwrap();

        assert_eq!(std::fs::metadata(store.path(Verdict::Vulnerable)).unwrap().len(), 0);
        assert_eq!(store.read(Verdict::NotExploitable).unwrap(), vec!["http://b.com/"]);
    }

    #[test]
    fn test_reset_all_creates_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(dir.path());

        store.reset_all().unwrap();

        assert!(store.path(Verdict::Vulnerable).exists());
        assert!(store.path(Verdict::NotExploitable).exists());
        assert!(store.read(Verdict::Vulnerable).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_list_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(temp_store(dir.path()).read(Verdict::Vulnerable).unwrap().is_empty());
    }
}
