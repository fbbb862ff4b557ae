//! Sitemap from a local directory tree

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::sitemap::generate_sitemap;
use super::{TaskContext, WorkProducer, parse_params};
use crate::config::ScannerConfig;
use crate::error::{Error, Result};
use crate::types::{LocalParams, SitemapOptions};

/// Producer for `local` tasks
#[derive(Debug, Clone)]
pub struct LocalProducer {
    extension: String,
}

impl LocalProducer {
    /// Create a scanner matching the configured page extension
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            extension: config.page_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Walk `dir` recursively and render every page file as a sitemap entry
    ///
    /// Each URL is `base_url` without its trailing `/`, then `/`, then the
    /// file name. Directory structure below `dir` is not part of the URL.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] when `dir` or `base_url` is empty
    /// - [`Error::NotFound`] when `dir` does not exist
    pub async fn generate_from_local_directory(
        &self,
        dir: &str,
        base_url: &str,
        options: &SitemapOptions,
    ) -> Result<String> {
        let urls = self.scan(dir, base_url).await?;
        Ok(generate_sitemap(&urls, options))
    }

    async fn scan(&self, dir: &str, base_url: &str) -> Result<Vec<String>> {
        if dir.trim().is_empty() || base_url.trim().is_empty() {
            return Err(Error::InvalidInput(
                "dirPath and baseUrl must be provided".into(),
            ));
        }

        let root = PathBuf::from(dir);
        if !tokio::fs::try_exists(&root).await? {
            return Err(Error::NotFound(format!("directory {dir}")));
        }

        let extension = self.extension.clone();
        let prefix = base_url.trim_end_matches('/').to_string();

        tokio::task::spawn_blocking(move || collect_pages(&root, &extension, &prefix))
            .await
            .map_err(|e| Error::Other(format!("directory scan task failed: {e}")))?
    }
}

impl Default for LocalProducer {
    fn default() -> Self {
        Self::new(&ScannerConfig::default())
    }
}

fn collect_pages(root: &Path, extension: &str, prefix: &str) -> Result<Vec<String>> {
    let suffix = format!(".{extension}");
    let mut urls = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Producer(format!("failed to scan directory: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };
        if name.ends_with(&suffix) {
            urls.push(format!("{prefix}/{name}"));
        }
    }

    Ok(urls)
}

#[async_trait]
impl WorkProducer for LocalProducer {
    async fn produce(&self, params: &serde_json::Value, ctx: &TaskContext) -> Result<String> {
        let params: LocalParams = parse_params(params)?;
        let urls = self.scan(&params.dir_path, &params.base_url).await?;
        ctx.report_progress(60).await;
        ctx.log(&format!("found {} pages", urls.len())).await;
        Ok(generate_sitemap(&urls, &params.options))
    }

    fn label(&self) -> &'static str {
        "scan"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn site_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a page").unwrap();
        fs::create_dir_all(dir.path().join("blog/2024")).unwrap();
        fs::write(dir.path().join("blog/post.html"), "").unwrap();
        fs::write(dir.path().join("blog/2024/deep.html"), "").unwrap();
        fs::write(dir.path().join("blog/style.css"), "").unwrap();
        dir
    }

    #[tokio::test]
    async fn scan_finds_html_files_recursively_with_flat_urls() {
        let dir = site_tree();
        let producer = LocalProducer::default();

        let mut urls = producer
            .scan(dir.path().to_str().unwrap(), "https://site.test/")
            .await
            .unwrap();
        urls.sort();

        assert_eq!(
            urls,
            vec![
                "https://site.test/deep.html",
                "https://site.test/index.html",
                "https://site.test/post.html",
            ]
        );
    }

    #[tokio::test]
    async fn base_url_without_trailing_slash_gets_one_separator() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "").unwrap();

        let urls = LocalProducer::default()
            .scan(dir.path().to_str().unwrap(), "https://site.test/docs")
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://site.test/docs/a.html"]);
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = LocalProducer::default()
            .generate_from_local_directory(
                missing.to_str().unwrap(),
                "https://site.test",
                &SitemapOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_arguments_are_invalid_input() {
        let producer = LocalProducer::default();
        let opts = SitemapOptions::default();

        assert!(matches!(
            producer.generate_from_local_directory("", "https://a", &opts).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            producer.generate_from_local_directory("/tmp", "", &opts).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn empty_directory_yields_empty_urlset() {
        let dir = tempfile::tempdir().unwrap();
        let xml = LocalProducer::default()
            .generate_from_local_directory(
                dir.path().to_str().unwrap(),
                "https://site.test",
                &SitemapOptions::default(),
            )
            .await
            .unwrap();
        assert!(!xml.contains("<url>"));
        assert!(xml.ends_with("</urlset>"));
    }

    #[tokio::test]
    async fn configured_extension_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.htm"), "").unwrap();
        fs::write(dir.path().join("b.html"), "").unwrap();

        let producer = LocalProducer::new(&ScannerConfig {
            page_extension: ".htm".into(),
        });
        let urls = producer
            .scan(dir.path().to_str().unwrap(), "https://s.test")
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://s.test/a.htm"]);
    }

    #[tokio::test]
    async fn produce_reads_camel_case_params() {
        let dir = site_tree();
        let xml = LocalProducer::default()
            .produce(
                &json!({
                    "dirPath": dir.path().to_str().unwrap(),
                    "baseUrl": "https://site.test",
                    "lastmod": "2024-05-01"
                }),
                &TaskContext::detached(),
            )
            .await
            .unwrap();

        assert_eq!(xml.matches("<url>").count(), 3);
        assert_eq!(xml.matches("<lastmod>2024-05-01</lastmod>").count(), 3);
    }
}
