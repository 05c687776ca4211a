// src/sources/mod.rs
pub mod html_listing;
pub mod rest_json;
pub mod rss_xml;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::sources::html_listing::{HtmlListingAdapter, ListingSelectors};
use crate::sources::rest_json::RestJsonAdapter;
use crate::sources::rss_xml::RssAdapter;
use crate::sources::types::SourceAdapter;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "source_articles_total",
            "Articles parsed from source adapters."
        );
        describe_counter!(
            "source_errors_total",
            "Adapter fetch/parse errors resolved to empty results."
        );
        describe_histogram!("source_parse_ms", "Adapter parse time in milliseconds.");
    });
}

/// Normalize upstream text: decode HTML entities, strip tags, collapse
/// whitespace, trim. Feed titles and descriptions routinely carry markup.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Parse a feed timestamp: RFC2822 (`pubDate`, including the `GMT`-style
/// obsolete zones real feeds carry) first, RFC3339 as fallback. `None` when
/// the string parses as neither; callers default to "now".
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let trimmed = ts.trim();
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The production source set: one REST/JSON API, two RSS feeds, one HTML
/// listing page. Sources missing credentials degrade to empty results at
/// fetch time rather than being excluded here.
pub fn default_adapters(
    cfg: &AppConfig,
    client: &reqwest::Client,
) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(RestJsonAdapter::new(
            "GNews",
            "https://gnews.io/api/v4/top-headlines",
            cfg.news_api_key.clone(),
            client.clone(),
        )),
        Arc::new(
            RssAdapter::from_url(
                "BBC News",
                "https://feeds.bbci.co.uk/news/rss.xml",
                client.clone(),
            )
            .with_category_feed(
                "technology",
                "https://feeds.bbci.co.uk/news/technology/rss.xml",
            )
            .with_category_feed(
                "business",
                "https://feeds.bbci.co.uk/news/business/rss.xml",
            )
            .with_category_feed(
                "science",
                "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml",
            )
            .with_category_feed("health", "https://feeds.bbci.co.uk/news/health/rss.xml"),
        ),
        Arc::new(RssAdapter::from_url(
            "The Guardian",
            "https://www.theguardian.com/world/rss",
            client.clone(),
        )),
        Arc::new(HtmlListingAdapter::new(
            "CNN Lite",
            "https://lite.cnn.com",
            ListingSelectors {
                entry: ".card--lite a[href]".to_string(),
                title: None,
                image: None,
            },
            client.clone(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_strips_and_collapses() {
        let s = "  <b>Hello&nbsp;&nbsp;world</b>\n &ldquo;ok&rdquo;  ";
        assert_eq!(normalize_text(s), "Hello world \u{201C}ok\u{201D}");
    }

    #[test]
    fn normalize_text_drops_multiline_markup() {
        let s = "Breaking:<br/>markets <a\nhref=\"x\">rally</a>";
        assert_eq!(normalize_text(s), "Breaking: markets rally");
    }

    #[test]
    fn feed_dates_parse_both_common_formats() {
        let rfc2822 = parse_feed_date("Tue, 05 Aug 2025 09:30:00 GMT").expect("rfc2822");
        assert_eq!(rfc2822.timestamp(), 1_754_386_200);

        let rfc3339 = parse_feed_date("2025-08-05T09:30:00Z").expect("rfc3339");
        assert_eq!(rfc3339, rfc2822);

        assert!(parse_feed_date("next Tuesday-ish").is_none());
        assert!(parse_feed_date("").is_none());
    }
}
