use std::cell::Cell;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::future::retry;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::{NotifierError, Result};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Total tries per URL, first one included.
    pub attempts: u32,
    pub retry_delay: Duration,
    pub referer: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            attempts: 3,
            retry_delay: Duration::from_millis(1200),
            referer: "https://askjiyun.com".to_string(),
        }
    }
}

/// Same delay between every try, then give up.
#[derive(Debug, Clone)]
pub struct FixedRetry {
    delay: Duration,
    retries: u32,
    remaining: u32,
}

impl FixedRetry {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        let retries = attempts.saturating_sub(1);
        Self {
            delay,
            retries,
            remaining: retries,
        }
    }
}

impl Backoff for FixedRetry {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.delay)
    }

    fn reset(&mut self) {
        self.remaining = self.retries;
    }
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko,en;q=0.8"));
        if let Ok(referer) = HeaderValue::from_str(&config.referer) {
            headers.insert(REFERER, referer);
        }

        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(config.timeout)
                .build()?,
            config,
        })
    }

    /// GET `url` as text, retrying failures and error statuses a fixed number of times.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let tries = Cell::new(0u32);
        let attempts = self.config.attempts.max(1);
        let tries_ref = &tries;

        let result = retry(FixedRetry::new(attempts, self.config.retry_delay), move || async move {
            tries_ref.set(tries_ref.get() + 1);
            self.get_once(url).await.map_err(|e| {
                warn!("GET failed ({url}) {e} (attempt {}/{attempts})", tries_ref.get());
                backoff::Error::transient(e)
            })
        })
        .await;

        result.map_err(|source| NotifierError::Fetch {
            url: url.to_string(),
            attempts: tries.get(),
            source,
        })
    }

    async fn get_once(&self, url: &str) -> reqwest::Result<String> {
        debug!("GET {url}");
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Advisory robots.txt check; any failure to read the file counts as allowed.
    pub async fn robots_allows(&self, url: &Url) -> bool {
        let robots_url = match url.join("/robots.txt") {
            Ok(robots_url) => robots_url,
            Err(e) => {
                warn!("robots.txt check failed: {e} (continuing)");
                return true;
            }
        };
        match self.get_once(robots_url.as_str()).await {
            Ok(body) => robots_txt_allows(&body, url.path()),
            Err(e) => {
                warn!("robots.txt check failed: {e} (continuing)");
                true
            }
        }
    }
}

/// Evaluates the `User-agent: *` group of a robots.txt body for `path`.
///
/// The longest matching `Allow`/`Disallow` prefix decides; `Allow` wins ties.
pub fn robots_txt_allows(robots: &str, path: &str) -> bool {
    let mut rules: Vec<(bool, &str)> = Vec::new();
    let mut group_applies = false;
    let mut reading_agents = false;

    for line in robots.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "user-agent" => {
                if !reading_agents {
                    group_applies = false;
                }
                reading_agents = true;
                group_applies |= value == "*";
            }
            "allow" | "disallow" => {
                reading_agents = false;
                if group_applies && !value.is_empty() {
                    rules.push((key == "allow", value));
                }
            }
            _ => reading_agents = false,
        }
    }

    rules
        .iter()
        .filter(|(_, prefix)| path.starts_with(prefix))
        .max_by_key(|(allow, prefix)| (prefix.len(), *allow))
        .map_or(true, |(allow, _)| *allow)
}
