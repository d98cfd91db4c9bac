use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SieveError {
    /// The formatter's input file is absent. Nothing has been written.
    #[error("Input file '{}' does not exist. Create it and run again, don't worry I'll wait!", .0.display())]
    InputMissing(PathBuf),

    /// A probe failed in a way that is neither a timeout nor a transport failure.
    #[error("Probe of {url} failed: {source}")]
    Probe {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Probe of {url} failed: {reason}")]
    UnexpectedProbe { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
