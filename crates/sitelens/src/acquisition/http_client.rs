//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just a GET with a hard deadline, a connect timeout, a
//! redirect cap and a browser-like user agent.

use std::time::Duration;

use crate::config::ExtractConfig;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Why a static fetch produced no markup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("fetch timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("server answered with HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// HTTP client for the static pass.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for sites that reject HTTP/2.
    h1_client: reqwest::Client,
    deadline: Duration,
}

impl HttpClient {
    pub fn new(config: &ExtractConfig) -> Self {
        let builder = || {
            reqwest::Client::builder()
                .timeout(config.fetch_timeout)
                .connect_timeout(config.connect_timeout)
                .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
                .user_agent(config.user_agent.as_str())
        };

        let client = builder().build().unwrap_or_default();
        let h1_client = builder().http1_only().build().unwrap_or_default();

        Self {
            client,
            h1_client,
            deadline: config.fetch_timeout,
        }
    }

    /// GET `url` within the configured deadline.
    ///
    /// Falls back to HTTP/1.1 on protocol errors (some CDNs reject HTTP/2).
    /// Any non-2xx status is a failure.
    pub async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let attempt = async {
            match self.get_inner(&self.client, url).await {
                Err(FetchError::Transport(msg))
                    if msg.contains("http2")
                        || msg.contains("protocol")
                        || msg.contains("connection closed") =>
                {
                    tracing::debug!("retrying {url} over HTTP/1.1: {msg}");
                    self.get_inner(&self.h1_client, url).await
                }
                other => other,
            }
        };
        match tokio::time::timeout(self.deadline, attempt).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.deadline)),
        }
    }

    async fn get_inner(&self, client: &reqwest::Client, url: &str) -> Result<FetchedPage, FetchError> {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await.map_err(|e| self.fetch_error(e))?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn fetch_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.deadline)
        } else {
            FetchError::Transport(describe(&e))
        }
    }
}

fn describe(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}
