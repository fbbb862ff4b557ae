//! Sitemap from an explicit URL list

use async_trait::async_trait;

use super::sitemap::generate_sitemap;
use super::{TaskContext, WorkProducer, parse_params};
use crate::error::{Error, Result};
use crate::types::{ManualParams, SitemapOptions};

/// Producer for `manual` tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualProducer;

/// Render the given URLs as a sitemap, preserving order
///
/// # Errors
///
/// [`Error::InvalidInput`] when `urls` is empty or contains a blank entry.
pub fn generate_from_urls(urls: &[String], options: &SitemapOptions) -> Result<String> {
    if urls.is_empty() {
        return Err(Error::InvalidInput("urls must be a non-empty array".into()));
    }
    if let Some(pos) = urls.iter().position(|u| u.trim().is_empty()) {
        return Err(Error::InvalidInput(format!("urls[{pos}] is empty")));
    }
    Ok(generate_sitemap(urls, options))
}

#[async_trait]
impl WorkProducer for ManualProducer {
    async fn produce(&self, params: &serde_json::Value, ctx: &TaskContext) -> Result<String> {
        let params: ManualParams = parse_params(params)?;
        let xml = generate_from_urls(&params.urls, &params.options)?;
        ctx.log(&format!("rendered {} urls", params.urls.len())).await;
        Ok(xml)
    }

    fn label(&self) -> &'static str {
        "manual"
    }
}
