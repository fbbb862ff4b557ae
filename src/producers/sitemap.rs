//! Sitemap XML serialization

use crate::types::SitemapOptions;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const URLSET_OPEN: &str = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;
const URLSET_CLOSE: &str = "</urlset>";

/// Render a sitemap with one `<url>` entry per URL, in input order
///
/// Optional tags are emitted in every entry when set, in the order
/// `lastmod`, `changefreq`, `priority`. Blank strings count as unset.
pub fn generate_sitemap<S: AsRef<str>>(urls: &[S], options: &SitemapOptions) -> String {
    let lastmod = non_blank(options.lastmod.as_deref());
    let changefreq = non_blank(options.changefreq.as_deref());

    let mut lines = Vec::with_capacity(urls.len() * 6 + 3);
    lines.push(XML_HEADER.to_string());
    lines.push(URLSET_OPEN.to_string());

    for url in urls {
        lines.push("  <url>".to_string());
        lines.push(format!("    <loc>{}</loc>", escape_xml(url.as_ref())));
        if let Some(lastmod) = lastmod {
            lines.push(format!("    <lastmod>{}</lastmod>", escape_xml(lastmod)));
        }
        if let Some(changefreq) = changefreq {
            lines.push(format!(
                "    <changefreq>{}</changefreq>",
                escape_xml(changefreq)
            ));
        }
        if let Some(priority) = options.priority {
            lines.push(format!("    <priority>{priority}</priority>"));
        }
        lines.push("  </url>".to_string());
    }

    lines.push(URLSET_CLOSE.to_string());
    lines.join("\n")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
