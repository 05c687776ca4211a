// src/sources/html_listing.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use scraper::{Html, Selector};
use url::Url;

use crate::sources::normalize_text;
use crate::sources::types::{Article, SourceAdapter};

/// Structural selectors for one listing page. Brittle by nature; any
/// mismatch degrades the whole fetch to an empty result.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// One element per article entry; either an anchor itself or an element
    /// containing one.
    pub entry: String,
    /// Title node inside the entry; the anchor's own text when absent.
    pub title: Option<String>,
    /// `<img>` inside the entry for the article image.
    pub image: Option<String>,
}

/// HTML-scrape adapter for sites without an API or feed. The category
/// argument is ignored; a listing page is its own source-specific default.
pub struct HtmlListingAdapter {
    name: String,
    page_url: String,
    selectors: ListingSelectors,
    client: reqwest::Client,
}

impl HtmlListingAdapter {
    pub fn new(
        name: &str,
        page_url: &str,
        selectors: ListingSelectors,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.to_string(),
            page_url: page_url.to_string(),
            selectors,
            client,
        }
    }

    /// Locate article entries in a listing document and map them to
    /// articles. Relative hrefs resolve against `page_url`. Pure over the
    /// HTML string.
    pub fn parse_listing(
        name: &str,
        page_url: &str,
        selectors: &ListingSelectors,
        html: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        let base =
            Url::parse(page_url).with_context(|| format!("listing base url {page_url}"))?;
        let entry_sel = Selector::parse(&selectors.entry)
            .map_err(|e| anyhow!("entry selector {:?}: {e}", selectors.entry))?;
        let title_sel = selectors
            .title
            .as_deref()
            .map(Selector::parse)
            .transpose()
            .map_err(|e| anyhow!("title selector: {e}"))?;
        let image_sel = selectors
            .image
            .as_deref()
            .map(Selector::parse)
            .transpose()
            .map_err(|e| anyhow!("image selector: {e}"))?;

        static ANCHOR: OnceCell<Selector> = OnceCell::new();
        let anchor_sel = ANCHOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        let doc = Html::parse_document(html);
        let now = chrono::Utc::now();
        let mut out = Vec::new();

        for entry in doc.select(&entry_sel) {
            if out.len() >= limit {
                break;
            }
            let anchor = if entry.value().name() == "a" {
                Some(entry)
            } else {
                entry.select(anchor_sel).next()
            };
            let Some(anchor) = anchor else { continue };
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(resolved) = base.join(href) else { continue };

            let title_text = match &title_sel {
                Some(sel) => entry
                    .select(sel)
                    .next()
                    .map(|el| el.text().collect::<Vec<_>>().join(" "))
                    .unwrap_or_default(),
                None => anchor.text().collect::<Vec<_>>().join(" "),
            };

            let image = image_sel
                .as_ref()
                .and_then(|sel| entry.select(sel).next())
                .and_then(|img| img.value().attr("src"))
                .and_then(|src| base.join(src).ok())
                .map(|u| u.to_string());

            let article = Article {
                title: normalize_text(&title_text),
                description: String::new(),
                url: resolved.to_string(),
                source: name.to_string(),
                published_at: now,
                image,
                full_content: None,
            };
            if !article.is_valid() {
                continue;
            }
            out.push(article);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("source_parse_ms").record(ms);
        counter!("source_articles_total").increment(out.len() as u64);

        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for HtmlListingAdapter {
    async fn fetch(&self, _category: &str, limit: usize) -> Result<Vec<Article>> {
        crate::sources::ensure_metrics_described();

        let resp = match self.client.get(&self.page_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "listing fetch failed");
                counter!("source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(
                status = %resp.status(),
                source = %self.name,
                "listing page returned non-success"
            );
            counter!("source_errors_total").increment(1);
            return Ok(Vec::new());
        }
        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "listing body unreadable");
                counter!("source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        match Self::parse_listing(&self.name, &self.page_url, &self.selectors, &body, limit) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.name, "listing structure mismatch");
                counter!("source_errors_total").increment(1);
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
