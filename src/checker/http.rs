// src/checker/http.rs
// =============================================================================
// This module decides whether the links in a document are reachable.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when HEAD gets a 4xx/5xx (some servers reject HEAD)
// - Classifies every outcome as valid / invalid / timeout / error
// - Caches outcomes by URL so a URL is probed at most once per Checker
// - Runs probes concurrently through the bounded fan-out runner
//
// The network sits behind the LinkProbe trait so the rest of the checker
// (and the tests) never need a live connection.
//
// Rust concepts:
// - async_trait: async methods on a trait object (Arc<dyn LinkProbe>)
// - Mutex: the cache is shared between concurrently running probes
// - OnceCell: callers racing on the same URL await one shared probe
// =============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::batch::fan_out;
use super::markdown::LinkRecord;
use super::report::{LinkCheck, LinkOutcome};
use crate::config::LinkSettings;
use crate::error::Result;
use crate::policy::Strictness;

/// The classification of one link probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Final response below 400
    Valid,
    /// 4xx/5xx response, or the request failed (DNS, TLS, connection refused)
    Invalid,
    /// No response within the probe deadline
    Timeout,
    /// The request could not even be built (malformed URL)
    Error,
}

/// The cached outcome for a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheckResult {
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl LinkCheckResult {
    pub fn valid(status_code: u16) -> Self {
        LinkCheckResult {
            status: LinkStatus::Valid,
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn invalid(status_code: Option<u16>, error: impl Into<String>) -> Self {
        LinkCheckResult {
            status: LinkStatus::Invalid,
            status_code,
            error: Some(error.into()),
        }
    }

    pub fn timeout() -> Self {
        LinkCheckResult {
            status: LinkStatus::Timeout,
            status_code: None,
            error: Some("Request timed out".to_string()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        LinkCheckResult {
            status: LinkStatus::Error,
            status_code: None,
            error: Some(error.into()),
        }
    }
}

/// One reachability check of a single URL
///
/// Implementations must always return a classified outcome; failures are
/// results, not errors.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> LinkCheckResult;
}

/// The real probe: HEAD first, GET on a 4xx/5xx
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(settings: &LinkSettings) -> Result<Self> {
        // One client for all probes (connection pooling)
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(HttpProbe { client })
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> LinkCheckResult {
        let response = match self.client.head(url).send().await {
            Ok(response) if is_error_status(response.status()) => {
                debug!(url, status = response.status().as_u16(), "HEAD rejected, retrying with GET");
                self.client.get(url).send().await
            }
            other => other,
        };

        let result = match response {
            Ok(response) => classify_status(response.status()),
            Err(e) => categorize_error(e),
        };
        debug!(url, status = ?result.status, code = ?result.status_code, "probed link");
        result
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

// Redirects are followed by the client, so anything below 400 here is a
// page that answered.
fn classify_status(status: StatusCode) -> LinkCheckResult {
    let code = status.as_u16();
    if code < 400 {
        LinkCheckResult::valid(code)
    } else {
        LinkCheckResult::invalid(Some(code), format!("HTTP {}", code))
    }
}

// Categorizes reqwest errors
//
// - timeout: the probe deadline passed
// - builder: the URL could not be turned into a request at all
// - everything else (DNS, TLS, refused, too many redirects): invalid
fn categorize_error(error: reqwest::Error) -> LinkCheckResult {
    if error.is_timeout() {
        LinkCheckResult::timeout()
    } else if error.is_builder() {
        LinkCheckResult::error(error.to_string())
    } else {
        LinkCheckResult::invalid(error.status().map(|s| s.as_u16()), error.to_string())
    }
}

/// Bounded, append-only link outcome cache
///
/// An entry is never replaced once stored. When the cache is full the
/// oldest insertion is evicted.
pub struct LinkCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, LinkCheckResult>,
    order: VecDeque<String>,
}

impl LinkCache {
    pub fn new(capacity: usize) -> Self {
        LinkCache {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, url: &str) -> Option<LinkCheckResult> {
        self.lock().entries.get(url).cloned()
    }

    pub fn insert(&self, url: &str, result: LinkCheckResult) {
        let mut inner = self.lock();
        if inner.entries.contains_key(url) {
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(url.to_string());
        inner.entries.insert(url.to_string(), result);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        lock(&self.inner)
    }
}

// A panic while holding one of these locks cannot leave a half-written
// entry behind, so a poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Probes links through a cache and a bounded worker pool
pub struct LinkResolver {
    probe: Arc<dyn LinkProbe>,
    cache: LinkCache,
    /// One cell per URL currently being probed; concurrent callers wait on it
    in_flight: Mutex<HashMap<String, Arc<OnceCell<LinkCheckResult>>>>,
    max_concurrent: usize,
}

impl LinkResolver {
    pub fn new(probe: Arc<dyn LinkProbe>, settings: &LinkSettings) -> Self {
        LinkResolver {
            probe,
            cache: LinkCache::new(settings.cache_capacity),
            in_flight: Mutex::new(HashMap::new()),
            max_concurrent: settings.max_concurrent,
        }
    }

    pub fn cache(&self) -> &LinkCache {
        &self.cache
    }

    // Resolves one URL, consulting the cache first
    //
    // Concurrent callers asking for the same URL share a single probe.
    pub async fn resolve(&self, url: &str) -> LinkCheckResult {
        if let Some(cached) = self.cache.get(url) {
            debug!(url, "link cache hit");
            return cached;
        }

        let cell = {
            let mut in_flight = lock(&self.in_flight);
            Arc::clone(in_flight.entry(url.to_string()).or_default())
        };

        let result = cell
            .get_or_init(|| async {
                // Another caller may have finished between our miss and now
                if let Some(cached) = self.cache.get(url) {
                    return cached;
                }
                let result = self.probe.probe(url).await;
                self.cache.insert(url, result.clone());
                result
            })
            .await
            .clone();

        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(url).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            in_flight.remove(url);
        }
        result
    }

    // Resolves many URLs with at most `max_concurrent` probes in flight.
    // Results come back in input order.
    pub async fn resolve_all(&self, urls: Vec<String>) -> Vec<LinkCheckResult> {
        fan_out(urls, self.max_concurrent, |url| async move {
            self.resolve(&url).await
        })
        .await
    }

    // The link category check
    //
    // Parameters:
    //   links: deduplicated links from the scanner, in document order
    //   strictness: skip/loose accept every link without touching the network,
    //               normal fails on invalid links, strict also fails on timeouts
    pub async fn check_links(&self, links: &[LinkRecord], strictness: Strictness) -> LinkCheck {
        if matches!(strictness, Strictness::Skip | Strictness::Loose) {
            let accepted: Vec<LinkOutcome> = links
                .iter()
                .map(|link| outcome(link, LinkCheckResult {
                    status: LinkStatus::Valid,
                    status_code: None,
                    error: None,
                }))
                .collect();
            return LinkCheck {
                total_links: links.len(),
                valid_links: accepted.len(),
                invalid_links: 0,
                timeout_links: 0,
                valid_links_list: accepted,
                invalid_links_list: Vec::new(),
                timeout_links_list: Vec::new(),
                check_passed: true,
                strictness,
                note: Some(format!(
                    "{} mode: link reachability is not verified (suited to LICENSE and similar documents)",
                    if strictness == Strictness::Skip { "Skip" } else { "Loose" }
                )),
                error: None,
            };
        }

        let urls = links.iter().map(|link| link.url.clone()).collect();
        let results = self.resolve_all(urls).await;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        let mut timeout = Vec::new();
        for (link, result) in links.iter().zip(results) {
            let status = result.status;
            let entry = outcome(link, result);
            match status {
                LinkStatus::Valid => valid.push(entry),
                LinkStatus::Timeout => timeout.push(entry),
                LinkStatus::Invalid | LinkStatus::Error => invalid.push(entry),
            }
        }

        let check_passed = match strictness {
            Strictness::Strict => invalid.is_empty() && timeout.is_empty(),
            _ => invalid.is_empty(),
        };

        LinkCheck {
            total_links: links.len(),
            valid_links: valid.len(),
            invalid_links: invalid.len(),
            timeout_links: timeout.len(),
            valid_links_list: valid,
            invalid_links_list: invalid,
            timeout_links_list: timeout,
            check_passed,
            strictness,
            note: None,
            error: None,
        }
    }
}

fn outcome(link: &LinkRecord, result: LinkCheckResult) -> LinkOutcome {
    LinkOutcome {
        text: link.text.clone(),
        url: link.url.clone(),
        kind: link.kind,
        status: result.status,
        status_code: result.status_code,
        error: result.error,
    }
}
