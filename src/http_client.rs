use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;

use crate::config::HttpConfig;
use crate::proxy_pool::ProxyPool;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

/// Seam between the retry logic and the wire. One call, one attempt;
/// returns the body only on a 2xx response.
pub trait Transport {
    fn get(&self, url: &str, proxy: Option<&str>) -> Result<String, FetchError>;
}

/// Real transport: blocking reqwest with a browser-like identity.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        ReqwestTransport { client, timeout }
    }

    fn random_user_agent() -> &'static str {
        let uas = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        let mut rng = rand::thread_rng();
        uas[rng.gen_range(0..uas.len())]
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, proxy: Option<&str>) -> Result<String, FetchError> {
        // Proxies are a client-level setting in reqwest, so a proxied
        // attempt gets its own client; the direct path reuses one client
        // and its cookie jar.
        let response = match proxy {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url)?;
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .proxy(proxy)
                    .build()?;
                client
                    .get(url)
                    .header(USER_AGENT, Self::random_user_agent())
                    .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .send()?
            }
            None => self
                .client
                .get(url)
                .header(USER_AGENT, Self::random_user_agent())
                .send()?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

/// GET with politeness delay, retry/backoff, and proxy rotation.
///
/// Every attempt may flip proxy health in the shared pool: a failure flags
/// the proxy bad, a success unflags it.
pub struct HttpClient<T: Transport> {
    transport: T,
    pool: Option<Arc<ProxyPool>>,
    config: HttpConfig,
}

impl HttpClient<ReqwestTransport> {
    pub fn new(config: HttpConfig, pool: Option<Arc<ProxyPool>>) -> Self {
        let transport = ReqwestTransport::new(config.timeout);
        HttpClient { transport, pool, config }
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T, config: HttpConfig, pool: Option<Arc<ProxyPool>>) -> Self {
        HttpClient { transport, pool, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = FetchError::Other("no attempts made".to_string());

        for attempt in 0..self.config.max_retries {
            let proxy = self.pool.as_ref().and_then(|p| p.next());

            self.polite_delay();
            match self.transport.get(url, proxy.as_deref()) {
                Ok(body) => {
                    if let (Some(pool), Some(proxy)) = (&self.pool, &proxy) {
                        pool.mark_good(proxy);
                    }
                    return Ok(body);
                }
                Err(e) => {
                    debug!("Attempt {}/{} failed for {}: {}", attempt + 1, self.config.max_retries, url, e);
                    if let (Some(pool), Some(proxy)) = (&self.pool, &proxy) {
                        pool.mark_bad(proxy);
                    }
                    last_error = e;
                    if attempt + 1 < self.config.max_retries {
                        let backoff = self.config.base_delay * 2u32.pow(attempt as u32);
                        if !backoff.is_zero() {
                            thread::sleep(backoff);
                        }
                    }
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, self.config.max_retries);
        Err(last_error)
    }

    /// Random pause before every outbound request. Not a backoff: this runs
    /// on the happy path too, to stay polite to servers we do not control.
    fn polite_delay(&self) {
        let min = self.config.polite_min;
        let max = self.config.polite_max.max(min);
        if max.is_zero() {
            return;
        }
        let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
        thread::sleep(Duration::from_millis(millis as u64));
    }
}
