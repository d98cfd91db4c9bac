pub mod client;

pub use client::HttpClient;

use async_trait::async_trait;

use crate::errors::SieveError;

/// Outcome of fetching a single target. Exactly one shape, never partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResponse {
    /// The server answered; the body is kept whatever the status code.
    Body(String),
    /// The bounded wait expired before a full response arrived.
    Timeout,
    /// Connection, TLS or mid-body transport failure.
    TransportFailure,
}

/// Fetches a target and reports the response shape.
///
/// Only timeouts and transport failures are folded into `ProbeResponse`.
/// Any other failure is returned as an error and aborts the batch.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str) -> Result<ProbeResponse, SieveError>;
}
