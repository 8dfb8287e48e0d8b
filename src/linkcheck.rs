//! HTTP existence probe for candidate links.

use async_trait::async_trait;
use tracing::debug;

use crate::engine::LinkChecker;

pub struct HttpLinkChecker {
    http: reqwest::Client,
}

impl HttpLinkChecker {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { http }
    }
}

impl Default for HttpLinkChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn link_ok(&self, url: &str) -> bool {
        match self.http.get(url).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                debug!("Link check {url}: {}", response.status());
                ok
            }
            Err(e) => {
                // Network failure and dead link look the same to callers.
                debug!("Link check {url} failed: {e}");
                false
            }
        }
    }
}
