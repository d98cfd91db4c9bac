use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::core::outcome_store::OutcomeStore;
use crate::core::Verdict;
use crate::errors::SieveError;
use crate::http::{ProbeResponse, Prober};
use crate::utils::detector::SignatureDetector;
use crate::utils::read_lines;
use crate::SinkRef;

/// Where the batch reads its targets from.
#[derive(Debug, Clone)]
pub struct TargetSources {
    /// Written by the discoverer.
    pub discovered: PathBuf,
    /// Written by the formatter; read in file mode.
    pub formatted: PathBuf,
}

impl TargetSources {
    pub fn select(&self, file_mode: bool) -> &PathBuf {
        if file_mode { &self.formatted } else { &self.discovered }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub vulnerable: usize,
    pub not_exploitable: usize,
}

/// Sequential probe-and-classify pipeline.
///
/// For every target, in list order:
/// 1. Probe it through the `Prober`
/// 2. Match the body against the signature table
/// 3. Notify the sink
/// 4. Append the target to the matching outcome list
///
/// Timeouts and transport failures are classified as not exploitable, the
/// same as a clean body. Any other probe error stops the batch; targets
/// already recorded stay recorded.
pub struct Classifier {
    prober: Arc<dyn Prober>,
    detector: SignatureDetector,
    store: OutcomeStore,
    sources: TargetSources,
    sink: SinkRef,
}

impl Classifier {
    pub fn new(
        prober: Arc<dyn Prober>,
        store: OutcomeStore,
        sources: TargetSources,
        sink: SinkRef,
    ) -> Self {
        Self {
            prober,
            detector: SignatureDetector::new(),
            store,
            sources,
            sink,
        }
    }

    pub fn store(&self) -> &OutcomeStore {
        &self.store
    }

    /// Probes one target and returns its verdict. Nothing is persisted.
    pub async fn classify(&self, target: &str) -> Result<Verdict, SieveError> {
        debug!("{}: pending -> probing", target);

        let verdict = match self.prober.probe(target).await? {
            ProbeResponse::Body(body) => match self.detector.matched_signature(&body) {
                Some(signature) => {
                    info!("{}: matched signature {:?}", target, signature);
                    Verdict::Vulnerable
                }
                None => {
                    info!("{}: no signature in response", target);
                    Verdict::NotExploitable
                }
            },
            ProbeResponse::Timeout => {
                info!("{}: timed out, unable to confirm", target);
                Verdict::NotExploitable
            }
            ProbeResponse::TransportFailure => {
                info!("{}: transport or TLS failure, unable to confirm", target);
                Verdict::NotExploitable
            }
        };

        debug!("{}: probing -> {}", target, verdict);
        Ok(verdict)
    }

    /// Reads the selected target list without probing anything.
    /// Lines are trimmed, blanks dropped, duplicates and order kept.
    pub fn pending_targets(&self, file_mode: bool) -> Result<Vec<String>, SieveError> {
        Ok(read_lines(self.sources.select(file_mode))?)
    }

    /// Classifies every target of the selected list and records each verdict.
    pub async fn run(&self, file_mode: bool) -> Result<RunSummary, SieveError> {
        let path = self.sources.select(file_mode);
        let targets = read_lines(path)?;
        let total = targets.len();
        let mut summary = RunSummary::default();

        self.sink.on_log(
            "phase",
            &format!("[*] Checking {} target(s) from {}", total, path.display()),
        );

        for target in targets {
            self.sink.on_progress("Probing", summary.scanned + 1, total);

            let verdict = self.classify(&target).await?;

            self.sink.on_verdict(&target, verdict);
            self.store.record(&target, verdict)?;

            summary.scanned += 1;
            match verdict {
                Verdict::Vulnerable => summary.vulnerable += 1,
                Verdict::NotExploitable => summary.not_exploitable += 1,
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProber(ProbeResponse);

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, _target: &str) -> Result<ProbeResponse, SieveError> {
            Ok(self.0.clone())
        }
    }

    struct NullSink;

    impl crate::ScanEventSink for NullSink {
        fn on_log(&self, _level: &str, _message: &str) {}
        fn on_verdict(&self, _target: &str, _verdict: Verdict) {}
        fn on_progress(&self, _phase: &str, _current: usize, _total: usize) {}
    }

    fn classifier_with(response: ProbeResponse) -> Classifier {
        Classifier::new(
            Arc::new(FixedProber(response)),
            OutcomeStore::new("/nonexistent/v.txt", "/nonexistent/n.txt"),
            TargetSources {
                discovered: PathBuf::from("/nonexistent/sites.txt"),
                formatted: PathBuf::from("/nonexistent/formatted.txt"),
            },
            Arc::new(NullSink),
        )
    }

    #[tokio::test]
    async fn test_signature_body_is_vulnerable() {
        let classifier = classifier_with(ProbeResponse::Body("SQL query error".to_string()));
        assert_eq!(classifier.classify("http://fakesite.com/").await.unwrap(), Verdict::Vulnerable);
    }

    #[tokio::test]
    async fn test_clean_body_is_not_exploitable() {
        let classifier = classifier_with(ProbeResponse::Body("some html".to_string()));
        assert_eq!(classifier.classify("http://fakesite.com/").await.unwrap(), Verdict::NotExploitable);
    }

    #[tokio::test]
    async fn test_timeout_is_not_exploitable() {
        let classifier = classifier_with(ProbeResponse::Timeout);
        assert_eq!(classifier.classify("http://fakesite.com/").await.unwrap(), Verdict::NotExploitable);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_exploitable() {
        let classifier = classifier_with(ProbeResponse::TransportFailure);
        assert_eq!(classifier.classify("http://fakesite.com/").await.unwrap(), Verdict::NotExploitable);
    }

    #[test]
    fn test_source_selection() {
        let sources = TargetSources {
            discovered: PathBuf::from("d.txt"),
            formatted: PathBuf::from("f.txt"),
        };
        assert_eq!(sources.select(true), &PathBuf::from("f.txt"));
        assert_eq!(sources.select(false), &PathBuf::from("d.txt"));
    }

    #[tokio::test]
    async fn test_run_keeps_duplicates_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("formatted.txt");
        std::fs::write(&list, "http://a.com/?id=1\n\n   \n  http://b.com/?id=2 \nhttp://a.com/?id=1\n").unwrap();

        let store = OutcomeStore::new(dir.path().join("v.txt"), dir.path().join("n.txt"));
        let classifier = Classifier::new(
            Arc::new(FixedProber(ProbeResponse::Timeout)),
            store.clone(),
            TargetSources { discovered: dir.path().join("unused.txt"), formatted: list },
            Arc::new(NullSink),
        );

        let summary = classifier.run(true).await.unwrap();
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.not_exploitable, 3);
        assert_eq!(
            store.read(Verdict::NotExploitable).unwrap(),
            vec!["http://a.com/?id=1", "http://b.com/?id=2", "http://a.com/?id=1"]
        );
    }

    #[tokio::test]
    async fn test_missing_target_list_is_an_error() {
        let classifier = classifier_with(ProbeResponse::Timeout);
        assert!(matches!(classifier.run(true).await, Err(SieveError::Io(_))));
    }
}
