// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes one HTTP HEAD request per link (lightweight, no body download)
// - Follows a bounded number of redirects; past the limit the last
//   response counts as the answer
// - Turns the outcome into a Health value: healthy for 2xx/3xx, unhealthy
//   for anything else, with the status code or the error text
//
// There is no retry here. A link that fails once is reported unhealthy and
// gets another chance on the next sweep.
//
// Rust concepts:
// - Traits: Prober is the seam between the sweep and the network, so tests
//   can swap in a fake prober
// - async-trait: lets us put an async fn in a trait used as Arc<dyn Prober>
// =============================================================================

use async_trait::async_trait;
use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::models::Health;

/// Error text recorded for links that can't be requested at all
pub const INVALID_URL: &str = "invalid URL";

/// Something that can check one URL
///
/// Implementations must never fail: every outcome, including "the URL is
/// garbage", is a Health value.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Health;
}

/// Settings for the HTTP prober
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Client-side timeout for the whole request
    pub timeout: Duration,
    /// How many redirects to follow before taking the response as final
    pub max_redirects: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 10,
        }
    }
}

/// Probes links with reqwest
///
/// One Client is shared by every probe so connections get pooled.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(config: &ProberConfig) -> reqwest::Result<Self> {
        let max_redirects = config.max_redirects;

        // Policy::limited(n) errors out after n redirects. We want the
        // redirect response itself back instead, so stop() rather than
        // error().
        let policy = Policy::custom(move |attempt: Attempt| {
            if attempt.previous().len() >= max_redirects {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(policy)
            .user_agent(concat!("linksnapper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Health {
        // Catch malformed URLs up front so they get a stable error message
        // instead of whatever the request builder says
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(%url, error = %e, "not probing malformed URL");
                return Health::failed(INVALID_URL);
            }
        };

        match self.client.head(parsed).send().await {
            Ok(response) => classify_status(response.status().as_u16()),
            Err(e) if e.is_builder() => Health::failed(INVALID_URL),
            Err(e) => Health::failed(describe_error(&e)),
        }
    }
}

/// Maps an HTTP status code to a Health value
///
/// 2xx and 3xx are healthy. A 3xx can only get here when the redirect
/// limit was hit, and the server did answer, so it counts.
pub fn classify_status(status_code: u16) -> Health {
    if (200..400).contains(&status_code) {
        Health::healthy(status_code)
    } else {
        Health::bad_status(status_code)
    }
}

// reqwest's top-level message is often just "error sending request for url
// (...)"; the useful part (connection refused, dns error, ...) is further
// down the source chain, so join the whole chain.
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why HEAD instead of GET?
//    - We only care whether the server answers, not what it says
//    - HEAD skips the body, so a sweep over hundreds of links stays cheap
//
// 2. Why is 3xx healthy?
//    - Normally reqwest follows redirects for us and we see the final status
//    - We only see a 3xx when we stopped following after max_redirects, and
//      the server was clearly up to send it
//
// 3. Why is Prober a trait?
//    - The sweep holds an Arc<dyn Prober>
//    - In production that's HttpProber; in tests it's a fake that counts how
//      many probes run at once
// -----------------------------------------------------------------------------
