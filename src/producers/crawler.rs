//! Breadth-first same-host site crawler
//!
//! Pages are fetched one depth level at a time. Within a level up to
//! `max_concurrency` requests run at once; between levels the crawler pauses
//! for `request_interval`. A page counts as discovered when it answers with a
//! 2xx status; fetch errors, timeouts and non-2xx answers are logged and
//! skipped. Links are only followed out of HTML responses and only when they
//! stay on the start URL's host and port.

use futures::stream::{self, StreamExt};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{Error, Result};

static HREF_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

/// HTTP crawler used by the `auto` producer
#[derive(Debug, Clone)]
pub struct SiteCrawler {
    client: reqwest::Client,
    config: CrawlerConfig,
}

/// Outcome of fetching one page
enum Fetched {
    /// 2xx answer, with the links found in the body
    Page(Vec<Url>),
    /// Network error, timeout or non-2xx answer
    Skipped,
}

impl SiteCrawler {
    /// Create a crawler with its own HTTP client
    ///
    /// # Errors
    /// Returns [`Error::Network`] if the HTTP client cannot be created
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Crawl from `start`, following links up to `max_depth` hops
    ///
    /// Depth 0 fetches only the start page. URLs are returned in discovery
    /// order (breadth first, then document order) without duplicates.
    ///
    /// # Errors
    /// Returns [`Error::Producer`] when `cancel` fires before the crawl ends.
    pub async fn crawl(
        &self,
        start: &Url,
        max_depth: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let link_pattern = HREF_PATTERN
            .as_ref()
            .map_err(|e| Error::Other(format!("invalid link pattern: {e}")))?;

        let start = normalize(start.clone());
        let mut seen: HashSet<String> = HashSet::from([start.to_string()]);
        let mut frontier = vec![start.clone()];
        let mut pages = Vec::new();
        let max_pages = self.config.max_pages.unwrap_or(usize::MAX);

        for depth in 0..=max_depth {
            if frontier.is_empty() || pages.len() >= max_pages {
                break;
            }

            let wave = std::mem::take(&mut frontier);
            tracing::debug!(depth, pages = wave.len(), "Fetching crawl wave");

            let fetches = stream::iter(wave)
                .map(|url| async move {
                    let outcome = self.fetch(&url, link_pattern).await;
                    (url, outcome)
                })
                .buffered(self.config.max_concurrency.max(1))
                .collect::<Vec<_>>();

            let results = tokio::select! {
                results = fetches => results,
                _ = cancel.cancelled() => {
                    return Err(Error::Producer("crawl cancelled".into()));
                }
            };

            for (url, outcome) in results {
                let Fetched::Page(links) = outcome else {
                    continue;
                };
                if pages.len() >= max_pages {
                    break;
                }
                pages.push(url.to_string());

                if depth == max_depth {
                    continue;
                }
                for link in links {
                    if same_site(&start, &link) && seen.insert(link.to_string()) {
                        frontier.push(link);
                    }
                }
            }

            if !frontier.is_empty() && !self.config.request_interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.request_interval) => {}
                    _ = cancel.cancelled() => {
                        return Err(Error::Producer("crawl cancelled".into()));
                    }
                }
            }
        }

        tracing::info!(start = %start, pages = pages.len(), "Crawl finished");
        Ok(pages)
    }

    async fn fetch(&self, url: &Url, link_pattern: &Regex) -> Fetched {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, timeout = e.is_timeout(), "Fetch failed");
                return Fetched::Skipped;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "Skipping non-2xx page");
            return Fetched::Skipped;
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));
        if !is_html {
            return Fetched::Page(Vec::new());
        }

        match response.text().await {
            Ok(body) => Fetched::Page(extract_links(url, &body, link_pattern)),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Failed to read page body");
                Fetched::Skipped
            }
        }
    }
}

/// Resolve every anchor href in `body` against `base`
///
/// Fragments are stripped and only http(s) links are kept.
fn extract_links(base: &Url, body: &str, link_pattern: &Regex) -> Vec<Url> {
    link_pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| base.join(&href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(normalize)
        .collect()
}

fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn same_site(start: &Url, candidate: &Url) -> bool {
    start.host_str() == candidate.host_str()
        && start.port_or_known_default() == candidate.port_or_known_default()
}

fn decode_entities(href: &str) -> String {
    href.replace("&amp;", "&")
}
