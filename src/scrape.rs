// src/scrape.rs
//! # Content Scraper
//! Best-effort main-body extraction for article pages.
//!
//! Extraction is a decision table: an ordered list of container selectors,
//! each gated on a minimum text length, with the page body as the final
//! fallback. The batch path is intentionally sequential with an enforced
//! inter-request delay; rate-limit protection takes priority over latency.

use std::time::Duration;

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};

use crate::sources::types::Article;

/// Some origins reject obvious non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_DELAY: Duration = Duration::from_millis(500);

/// A candidate container must clear this before we stop trying selectors.
const MIN_CONTENT_CHARS: usize = 200;

/// Tried in order; the first candidate with enough visible text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role=\"main\"]",
    "main",
    ".article-body",
    ".article-content",
    ".story-body",
    ".post-content",
    ".entry-content",
    "#content",
];

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "iframe", "svg", "button",
];

/// Class/id substrings that mark chrome and ad furniture.
const NOISE_HINTS: &[&str] = &[
    "advert",
    "sponsor",
    "promo",
    "banner",
    "sidebar",
    "breadcrumb",
    "cookie",
    "newsletter",
    "subscribe",
    "share",
    "comment",
    "related",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "article", "main", "section", "ul", "ol", "li", "br", "h1", "h2", "h3", "h4",
    "h5", "h6", "blockquote", "figcaption", "tr", "table", "figure",
];

pub struct ContentScraper {
    client: reqwest::Client,
    request_delay: Duration,
}

impl ContentScraper {
    pub fn new() -> Self {
        Self::with_delay(REQUEST_DELAY)
    }

    /// Tests and latency-sensitive callers shorten the inter-request delay.
    pub fn with_delay(request_delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("building scraper http client");
        Self {
            client,
            request_delay,
        }
    }

    /// Fetch + extract; empty string on any error.
    pub async fn scrape(&self, url: &str) -> String {
        let body = match self.fetch_page(url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = ?e, %url, "article fetch failed");
                counter!("scrape_failures_total").increment(1);
                return String::new();
            }
        };
        let text = extract_content(&body);
        if text.is_empty() {
            // Page fetched fine, nothing survived extraction. Not an error.
            tracing::debug!(%url, "no extractable content");
        }
        text
    }

    async fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }

    /// Enrich articles with `fullContent`, strictly sequentially with the
    /// configured delay between requests. One empty result never blocks the
    /// rest of the batch.
    pub async fn scrape_all(&self, articles: &mut [Article]) {
        for (i, article) in articles.iter_mut().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_delay).await;
            }
            let text = self.scrape(&article.url).await;
            if !text.is_empty() {
                article.full_content = Some(text);
            }
        }
    }
}

impl Default for ContentScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Selector-priority extraction with a full-body fallback.
pub fn extract_content(html: &str) -> String {
    let doc = Html::parse_document(html);

    for raw in CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else { continue };
        if let Some(candidate) = doc.select(&sel).next() {
            let text = visible_text(candidate);
            if text.chars().count() >= MIN_CONTENT_CHARS {
                return normalize_whitespace(&text);
            }
        }
    }

    static BODY: OnceCell<Selector> = OnceCell::new();
    let body_sel = BODY.get_or_init(|| Selector::parse("body").unwrap());
    doc.select(body_sel)
        .next()
        .map(|body| normalize_whitespace(&visible_text(body)))
        .unwrap_or_default()
}

fn is_noise(el: &Element) -> bool {
    if NOISE_TAGS.contains(&el.name()) {
        return true;
    }
    let mut haystack = String::new();
    if let Some(id) = el.id() {
        haystack.push_str(&id.to_ascii_lowercase());
    }
    for class in el.classes() {
        haystack.push(' ');
        haystack.push_str(&class.to_ascii_lowercase());
    }
    !haystack.is_empty() && NOISE_HINTS.iter().any(|hint| haystack.contains(hint))
}

/// Text of an element with noise subtrees skipped entirely.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    if is_noise(el.value()) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                    if BLOCK_TAGS.contains(&child_el.value().name()) {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Collapse space/tab runs to one space and newline runs (with surrounding
/// space) to one newline, then trim.
pub fn normalize_whitespace(s: &str) -> String {
    static RE_SPACES: OnceCell<Regex> = OnceCell::new();
    static RE_NEWLINES: OnceCell<Regex> = OnceCell::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t]+").unwrap());
    let re_newlines = RE_NEWLINES.get_or_init(|| Regex::new(r"\s*\n\s*").unwrap());

    let unified = s.replace('\r', "\n");
    let collapsed = re_spaces.replace_all(&unified, " ");
    let collapsed = re_newlines.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}
