//! Sitemap from a recursive site crawl

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::crawler::SiteCrawler;
use super::sitemap::generate_sitemap;
use super::{TaskContext, WorkProducer, parse_params};
use crate::config::CrawlerConfig;
use crate::error::{Error, Result};
use crate::types::{AutoParams, SitemapOptions};

/// Producer for `auto` tasks
#[derive(Debug, Clone)]
pub struct CrawlProducer {
    crawler: SiteCrawler,
    default_max_depth: u32,
}

impl CrawlProducer {
    /// Create a crawl producer from the crawler settings
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let default_max_depth = config.default_max_depth;
        Ok(Self {
            crawler: SiteCrawler::new(config)?,
            default_max_depth,
        })
    }

    /// Crawl `start_url` up to `max_depth` hops and render the pages found
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when `start_url` is not an absolute http(s) URL.
    pub async fn generate_from_crawling(
        &self,
        start_url: &str,
        max_depth: u32,
        options: &SitemapOptions,
    ) -> Result<String> {
        let start = parse_start_url(start_url)?;
        let pages = self
            .crawler
            .crawl(&start, max_depth, &CancellationToken::new())
            .await?;
        Ok(generate_sitemap(&pages, options))
    }
}

fn parse_start_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("url must be a non-empty string".into()));
    }
    let url =
        Url::parse(raw).map_err(|e| Error::InvalidInput(format!("invalid url '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidInput(format!(
            "url must be an absolute http(s) URL, got '{raw}'"
        )));
    }
    Ok(url)
}

#[async_trait]
impl WorkProducer for CrawlProducer {
    async fn produce(&self, params: &serde_json::Value, ctx: &TaskContext) -> Result<String> {
        let params: AutoParams = parse_params(params)?;
        let start = parse_start_url(&params.url)?;
        let max_depth = params.max_depth.unwrap_or(self.default_max_depth);

        let pages = self
            .crawler
            .crawl(&start, max_depth, ctx.cancellation())
            .await?;

        ctx.report_progress(60).await;
        ctx.log(&format!("crawled {} pages", pages.len())).await;

        Ok(generate_sitemap(&pages, &params.options))
    }

    fn label(&self) -> &'static str {
        "crawl"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn producer() -> CrawlProducer {
        CrawlProducer::new(CrawlerConfig {
            request_interval: Duration::ZERO,
            request_timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn start_url_must_be_absolute_http() {
        assert!(parse_start_url("https://example.com").is_ok());
        assert!(matches!(
            parse_start_url(""),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_start_url("example.com/page"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_start_url("ftp://example.com/"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn generate_from_crawling_renders_discovered_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"<a href="/about">About</a>"#, "text/html"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/html"))
            .mount(&server)
            .await;

        let options = SitemapOptions {
            changefreq: Some("weekly".into()),
            ..Default::default()
        };
        let xml = producer()
            .generate_from_crawling(&server.uri(), 3, &options)
            .await
            .unwrap();

        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains(&format!("<loc>{}/about</loc>", server.uri())));
        assert_eq!(xml.matches("<changefreq>weekly</changefreq>").count(), 2);
    }

    #[tokio::test]
    async fn unreachable_site_yields_empty_sitemap() {
        // Nothing listens on this port once the server is dropped.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let xml = producer()
            .generate_from_crawling(&uri, 1, &SitemapOptions::default())
            .await
            .unwrap();
        assert!(!xml.contains("<url>"));
    }

    #[tokio::test]
    async fn produce_rejects_non_http_url_without_fetching() {
        let result = producer()
            .produce(&json!({"url": "file:///etc/passwd"}), &TaskContext::detached())
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn produce_uses_max_depth_from_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"<a href="/next">n</a>"#, "text/html"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/html"))
            .expect(0)
            .mount(&server)
            .await;

        let xml = producer()
            .produce(
                &json!({"url": server.uri(), "maxDepth": 0}),
                &TaskContext::detached(),
            )
            .await
            .unwrap();
        assert_eq!(xml.matches("<url>").count(), 1);
    }
}
