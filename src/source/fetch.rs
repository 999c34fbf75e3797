//! Release archive retrieval
//!
//! One GET per call, no retry. Anything but `200 OK` is an error.

use std::io::{self, Write};

/// Errors raised while downloading a release archive
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to query url {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to query url {url} with: status code {status}")]
    Status { url: String, status: u16 },

    #[error("failed to download {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Where release archives come from.
pub trait ReleaseSource {
    /// Stream the body at `url` into `sink`, returning the number of bytes written.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// HTTP(S) release source backed by `ureq`
pub struct HttpReleaseSource {
    agent: ureq::Agent,
}

impl HttpReleaseSource {
    pub fn new() -> Self {
        // Status codes are checked here so the error names the URL.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpReleaseSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseSource for HttpReleaseSource {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        tracing::info!(%url, "downloading release archive");

        let mut response = self.agent.get(url).call().map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mut reader = response.body_mut().as_reader();
        let written = io::copy(&mut reader, sink).map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(%url, bytes = written, "download complete");
        Ok(written)
    }
}
