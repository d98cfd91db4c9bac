use async_trait::async_trait;
use log::debug;
use rand::prelude::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Proxy, Response};
use std::time::Duration;

use super::{ProbeResponse, Prober};
use crate::errors::SieveError;

pub struct HttpClient {
    inner: Client,
    user_agents: Vec<&'static str>,
    default_timeout: Duration,
    default_headers: HeaderMap,
}

impl HttpClient {
    pub fn new(
        timeout_seconds: u64,
        proxy_url: Option<&str>,
        custom_headers: &[(String, String)],
        accept_invalid_certs: bool,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(timeout_seconds);

        let mut builder = ClientBuilder::new()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs);

        if let Some(proxy) = proxy_url {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        let inner = builder.build()?;

        let mut default_headers = HeaderMap::new();
        for (key, val) in custom_headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(val),
            ) {
                default_headers.insert(name, value);
            }
        }
        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) \
             Gecko/20100101 Firefox/120.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_0) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ];

        Ok(Self {
            inner,
            user_agents,
            default_timeout: timeout,
            default_headers,
        })
    }

    /// Plain GET with a random User-Agent and the configured headers.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let ua = self.get_random_user_agent();

        let mut req = self.inner
            .get(url)
            .header(reqwest::header::USER_AGENT, ua)
            .timeout(self.default_timeout);

        for (name, value) in self.default_headers.iter() {
            req = req.header(name, value);
        }

        req.send().await
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    fn get_random_user_agent(&self) -> &'static str {
        let mut rng = rand::rng();
        *self.user_agents.choose(&mut rng).unwrap_or(&"Mozilla/5.0")
    }
}

/// Folds a reqwest failure into a response shape, or hands it back when it
/// is not one of the absorbed categories.
fn absorb_error(err: reqwest::Error) -> Result<ProbeResponse, reqwest::Error> {
    if err.is_timeout() {
        Ok(ProbeResponse::Timeout)
    } else if err.is_connect() || err.is_request() || err.is_body() {
        Ok(ProbeResponse::TransportFailure)
    } else {
        Err(err)
    }
}

#[async_trait]
impl Prober for HttpClient {
    async fn probe(&self, target: &str) -> Result<ProbeResponse, SieveError> {
        let into_probe_error = |source: reqwest::Error| SieveError::Probe {
            url: target.to_string(),
            source,
        };

        let response = match self.get(target).await {
            Ok(response) => response,
            Err(e) => {
                debug!("request to {} failed: {}", target, e);
                return absorb_error(e).map_err(into_probe_error);
            }
        };

        debug!("{} answered with status {}", target, response.status());

        match response.text().await {
            Ok(body) => Ok(ProbeResponse::Body(body)),
            Err(e) => {
                debug!("reading body of {} failed: {}", target, e);
                absorb_error(e).map_err(into_probe_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let headers = vec![("X-Test".to_string(), "1".to_string())];
        let client = HttpClient::new(7, None, &headers, false).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(7));
        assert!(client.default_headers.contains_key("x-test"));
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let headers = vec![("bad header".to_string(), "1".to_string())];
        let client = HttpClient::new(5, None, &headers, false).unwrap();
        assert!(client.default_headers.is_empty());
    }

    #[test]
    fn test_random_user_agent_comes_from_pool() {
        let client = HttpClient::new(5, None, &[], false).unwrap();
        let ua = client.get_random_user_agent();
        assert!(client.user_agents.contains(&ua));
    }

    #[tokio::test]
    async fn test_malformed_url_is_not_absorbed() {
        let client = HttpClient::new(5, None, &[], false).unwrap();
        let result = client.probe("not a url").await;
        assert!(matches!(result, Err(SieveError::Probe { .. })));
    }
}
