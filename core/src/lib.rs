pub mod core;
pub mod errors;
pub mod http;
pub mod modules;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::core::classifier::{Classifier, RunSummary, TargetSources};
pub use crate::core::outcome_store::OutcomeStore;
pub use crate::core::Verdict;
pub use crate::errors::SieveError;
pub use crate::http::{HttpClient, ProbeResponse, Prober};
pub use crate::modules::discoverer::{
    build_query_url, extract_result_urls, Discoverer, HtmlSearchProvider, SearchProvider,
    DEFAULT_SEARCH_QUERY, SEARCH_PREFIX,
};
pub use crate::modules::formatter::format_file;
pub use crate::utils::detector::SignatureDetector;
pub use crate::utils::read_lines;

/// Shared scan configuration, threaded explicitly into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    pub search_query: String,
    pub timeout: u64,
    pub proxy: String,
    pub headers: Vec<String>,
    pub insecure: bool,
    pub discovered_targets: PathBuf,
    pub formatted_targets: PathBuf,
    pub vulnerable_list: PathBuf,
    pub not_exploitable_list: PathBuf,
    pub verbose: bool,
    pub dry_run: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            timeout: 10,
            proxy: String::new(),
            headers: Vec::new(),
            insecure: false,
            discovered_targets: PathBuf::from("tmp/sites_to_check.txt"),
            formatted_targets: PathBuf::from("tmp/formatted_sites.txt"),
            vulnerable_list: PathBuf::from("results/vulnerable.txt"),
            not_exploitable_list: PathBuf::from("results/not_exploitable.txt"),
            verbose: false,
            dry_run: false,
        }
    }
}

impl ScanConfig {
    /// Loads a JSON config file. Missing keys fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{}': {}", path.display(), e))?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn parsed_headers(&self) -> Vec<(String, String)> {
        parse_custom_headers(&self.headers)
    }

    pub fn proxy_ref(&self) -> Option<&str> {
        if self.proxy.is_empty() { None } else { Some(&self.proxy) }
    }

    pub fn target_sources(&self) -> TargetSources {
        TargetSources {
            discovered: self.discovered_targets.clone(),
            formatted: self.formatted_targets.clone(),
        }
    }

    pub fn outcome_store(&self) -> OutcomeStore {
        OutcomeStore::new(&self.vulnerable_list, &self.not_exploitable_list)
    }
}

pub fn parse_custom_headers(raw: &[String]) -> Vec<(String, String)> {
    raw.iter().filter_map(|h| {
        let mut parts = h.splitn(2, ':');
        let key = parts.next()?.trim().to_string();
        let val = parts.next().unwrap_or("").trim().to_string();
        if key.is_empty() { return None; }
        Some((key, val))
    }).collect()
}

/// Notification hook for the scan pipeline.
/// `on_verdict` fires for every target before its verdict is persisted.
pub trait ScanEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
    fn on_verdict(&self, target: &str, verdict: Verdict);
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

pub type SinkRef = Arc<dyn ScanEventSink>;

/// Colors a log line by level: success, error, warn, phase, anything else plain.
fn render_log(level: &str, message: &str) -> String {
    use colored::*;
    match level {
        "success" => message.green().to_string(),
        "error"   => message.red().to_string(),
        "warn"    => message.yellow().to_string(),
        "phase"   => message.bright_cyan().bold().to_string(),
        _         => message.to_string(),
    }
}

/// Terminal output sink for CLI usage.
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    pub fn new_ref(verbose: bool) -> SinkRef {
        Arc::new(Self { verbose })
    }
}

impl ScanEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use std::io::Write;
        let line = render_log(level, message);
        if level == "error" {
            eprint!("{}\r\n", line);
        } else {
            print!("{}\r\n", line);
        }
        std::io::stdout().flush().ok();
    }

    fn on_verdict(&self, target: &str, verdict: Verdict) {
        use colored::*;
        use std::io::Write;
        match verdict {
            Verdict::Vulnerable => print!(
                "{} {} {}\r\n",
                "[+]".green().bold(),
                "VULNERABLE".red().bold(),
                target.white()
            ),
            Verdict::NotExploitable => print!(
                "{} {}\r\n",
                "[-] not exploitable:".dimmed(),
                target.dimmed()
            ),
        }
        std::io::stdout().flush().ok();
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        use colored::*;
        use std::io::Write;
        if !self.verbose {
            return;
        }
        if total > 0 {
            print!("{}\r\n", format!("[*] {} ({}/{})", phase, current, total).bright_cyan());
        } else {
            print!("{}\r\n", format!("[*] {}", phase).bright_cyan());
        }
        std::io::stdout().flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_headers() {
        let raw = vec![
            "Cookie: sess=abc".to_string(),
            "X-Empty:".to_string(),
            ": no-name".to_string(),
            "Authorization: Bearer a:b".to_string(),
        ];
        let parsed = parse_custom_headers(&raw);
        assert_eq!(parsed, vec![
            ("Cookie".to_string(), "sess=abc".to_string()),
            ("X-Empty".to_string(), String::new()),
            ("Authorization".to_string(), "Bearer a:b".to_string()),
        ]);
    }

    #[test]
    fn test_config_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlsieve.json");
        std::fs::write(&path, r#"{"searchQuery":"user_id=","timeout":3}"#).unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.search_query, "user_id=");
        assert_eq!(config.timeout, 3);
        assert_eq!(config.vulnerable_list, PathBuf::from("results/vulnerable.txt"));
        assert!(config.proxy_ref().is_none());
    }

    #[test]
    fn test_render_log_levels() {
        colored::control::set_override(true);
        assert_eq!(render_log("info", "[*] Searching"), "[*] Searching");
        assert_eq!(render_log("debug", "[*] Searching"), "[*] Searching");
        assert_ne!(render_log("success", "[+] done"), "[+] done");
        assert!(render_log("error", "[!] boom").contains("[!] boom"));
        colored::control::unset_override();
    }

    #[test]
    fn test_config_load_missing_file() {
        assert!(ScanConfig::load("/nonexistent/sqlsieve.json").is_err());
    }
}
