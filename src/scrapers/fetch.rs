//! HTTP retrieval of candidate URLs.
//!
//! The [`Fetcher`] trait is the seam between the run loop and the network.
//! [`HttpFetcher`] is the `reqwest` implementation; tests substitute an
//! in-memory stub. There are no retries: a failure is reported once and the
//! candidate is skipped by the caller.

use crate::error::HarvestError;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; malay_news_scraper/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Raw response of a successful (2xx) fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub final_url: String,
    /// Charset label declared in the `Content-Type` header, if any.
    pub declared_charset: Option<String>,
    pub body: Vec<u8>,
}

/// Retrieve raw bytes for one URL.
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, HarvestError>;
}

/// `reqwest`-backed fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, HarvestError> {
        let fetch_err = |e: reqwest::Error| HarvestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let declared_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);
        let body = response.bytes().await.map_err(fetch_err)?.to_vec();

        debug!(%final_url, bytes = body.len(), charset = ?declared_charset, "Fetched");
        Ok(FetchedPage {
            final_url,
            declared_charset,
            body,
        })
    }
}

/// Extract the `charset=` parameter from a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// True when `final_url` is just the site's homepage, i.e. the ID did not
/// resolve to an article and the site redirected us to `/`.
pub fn is_homepage(final_url: &str, base_url: &str) -> bool {
    let strip = |u: &str| u.trim_end_matches('/').to_ascii_lowercase();
    strip(final_url) == strip(base_url)
}
