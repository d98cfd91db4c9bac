use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use scraper::{Html, Selector};
use url::Url;

use crate::http::HttpClient;
use crate::utils::write_lines;
use crate::SinkRef;

pub const SEARCH_PREFIX: &str = "https://www.google.com/search?num=100&q=";

/// Pages exposing a numeric id parameter.
pub const DEFAULT_SEARCH_QUERY: &str = "inurl:php?id=";

/// Submits a full query URL and returns the result links in rank order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query_url: &str) -> anyhow::Result<Vec<String>>;
}

/// Scrapes result links out of the search engine's HTML results page.
pub struct HtmlSearchProvider {
    client: Arc<HttpClient>,
}

impl HtmlSearchProvider {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for HtmlSearchProvider {
    async fn search(&self, query_url: &str) -> anyhow::Result<Vec<String>> {
        let response = self.client.get(query_url).await?.error_for_status()?;
        let html = response.text().await?;
        Ok(extract_result_urls(&html))
    }
}

pub fn build_query_url(query: &str) -> String {
    format!("{}{}", SEARCH_PREFIX, utf8_percent_encode(query, NON_ALPHANUMERIC))
}

/// Pulls outbound result links from a results page, first occurrence wins.
pub fn extract_result_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut urls = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        if let Some(url) = resolve_result_link(href) {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }

    urls
}

/// Unwraps `/url?q=` redirects and rejects links back into the search engine.
fn resolve_result_link(href: &str) -> Option<String> {
    let candidate = if href.starts_with("/url?") {
        let wrapped = Url::parse(&format!("https://www.google.com{}", href)).ok()?;
        wrapped
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&candidate).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_lowercase();
    if is_search_engine_host(&host) {
        return None;
    }
    Some(candidate)
}

fn is_search_engine_host(host: &str) -> bool {
    host == "google.com"
        || host.starts_with("google.")
        || host.contains(".google.")
        || host.ends_with("googleusercontent.com")
        || host.ends_with("gstatic.com")
}

/// Runs a search and writes the result links to the discovered-target list.
pub struct Discoverer {
    provider: Arc<dyn SearchProvider>,
    query: String,
    output: PathBuf,
    sink: SinkRef,
}

impl Discoverer {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        query: impl Into<String>,
        output: impl Into<PathBuf>,
        sink: SinkRef,
    ) -> Self {
        Self {
            provider,
            query: query.into(),
            output: output.into(),
            sink,
        }
    }

    pub fn query_url(&self) -> String {
        build_query_url(&self.query)
    }

    /// Overwrites the output list with the results, in provider order.
    /// Provider failures are returned unchanged.
    pub async fn discover(&self) -> anyhow::Result<Vec<String>> {
        let query_url = self.query_url();
        self.sink.on_log("info", &format!("[*] Searching for: {}", self.query));
        debug!("search url: {}", query_url);

        let urls = self.provider.search(&query_url).await?;
        if urls.is_empty() {
            warn!("search for {:?} returned no result links", self.query);
        }

        write_lines(&self.output, &urls)?;

        self.sink.on_log(
            "success",
            &format!("[+] Discovered {} URL(s), saved to {}", urls.len(), self.output.display()),
        );
        Ok(urls)
    }
}
