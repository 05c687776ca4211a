// src/categorize.rs
//! Keyword-based category filter over canonical articles.
//!
//! Each category maps to a fixed set of case-insensitive keywords; an empty
//! set (the "general" label, or any unknown category) passes everything
//! through. Matching is plain substring over the lower-cased title and
//! description — a stable filter, not a re-rank.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::sources::types::Article;

const ENV_PATH: &str = "CATEGORIES_PATH";

#[derive(Debug, Clone)]
pub struct Categorizer {
    /// Lower-cased category label -> lower-cased keywords.
    keywords: HashMap<String, Vec<String>>,
}

impl Categorizer {
    pub fn from_map(map: HashMap<String, Vec<String>>) -> Self {
        let keywords = map
            .into_iter()
            .map(|(label, words)| {
                let cleaned = words
                    .into_iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (label.to_lowercase(), cleaned)
            })
            .collect();
        Self { keywords }
    }

    /// Compiled-in keyword table for the landing use case.
    pub fn with_defaults() -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        let mut add = |label: &str, words: &[&str]| {
            map.insert(
                label.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            );
        };
        add("general", &[]);
        add(
            "technology",
            &[
                "tech",
                "software",
                "startup",
                "artificial intelligence",
                "cyber",
                "robot",
                "gadget",
                "silicon valley",
                "chip",
            ],
        );
        add(
            "business",
            &[
                "business", "market", "economy", "stock", "finance", "trade", "inflation",
                "earnings",
            ],
        );
        add(
            "sports",
            &[
                "sport",
                "football",
                "soccer",
                "basketball",
                "tennis",
                "olympic",
                "championship",
                "league",
                "tournament",
            ],
        );
        add(
            "science",
            &[
                "science", "research", "space", "nasa", "climate", "physics", "biology",
                "study",
            ],
        );
        add(
            "health",
            &[
                "health", "medical", "medicine", "vaccine", "hospital", "disease", "virus",
                "drug",
            ],
        );
        add(
            "entertainment",
            &[
                "entertainment",
                "movie",
                "film",
                "music",
                "celebrity",
                "box office",
                "streaming",
            ],
        );
        Self::from_map(map)
    }

    /// Load the keyword table from an explicit path. TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading categories from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Ok(Self::from_map(parse_categories(&content, ext.as_str())?))
    }

    /// Load using env var + fallbacks:
    /// 1) $CATEGORIES_PATH
    /// 2) config/categories.toml
    /// 3) config/categories.json
    /// 4) compiled defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("CATEGORIES_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from("config/categories.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/categories.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::with_defaults())
    }

    /// Keywords for a label; empty slice for unknown labels, which makes
    /// them pass-through.
    pub fn keywords_for(&self, category: &str) -> &[String] {
        self.keywords
            .get(&category.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn matches(&self, article: &Article, category: &str) -> bool {
        let keywords = self.keywords_for(category);
        if keywords.is_empty() {
            return true;
        }
        let title = article.title.to_lowercase();
        let description = article.description.to_lowercase();
        keywords
            .iter()
            .any(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
    }

    /// Stable filter; input order preserved.
    pub fn filter(&self, articles: Vec<Article>, category: &str) -> Vec<Article> {
        if self.keywords_for(category).is_empty() {
            return articles;
        }
        articles
            .into_iter()
            .filter(|a| self.matches(a, category))
            .collect()
    }
}

fn parse_categories(s: &str, hint_ext: &str) -> Result<HashMap<String, Vec<String>>> {
    let try_toml = hint_ext == "toml" || s.contains("[categories]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported categories format"))
}

fn parse_toml(s: &str) -> Result<HashMap<String, Vec<String>>> {
    #[derive(serde::Deserialize)]
    struct TomlCategories {
        categories: HashMap<String, Vec<String>>,
    }
    let v: TomlCategories = toml::from_str(s)?;
    Ok(v.categories)
}

fn parse_json(s: &str) -> Result<HashMap<String, Vec<String>>> {
    let v: HashMap<String, Vec<String>> = serde_json::from_str(s)?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            url: format!("https://example.org/{}", title.len()),
            source: "Test".to_string(),
            published_at: Utc::now(),
            image: None,
            full_content: None,
        }
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let mut map = HashMap::new();
        map.insert("technology".to_string(), vec!["ia".to_string()]);
        let c = Categorizer::from_map(map);

        // "ia" appears inside "Inteligencia", so this matches.
        let hit = article("Inteligencia artificial avanza", "");
        assert!(c.matches(&hit, "Technology"));

        // No "ia" substring anywhere in title or description.
        let miss = article("Tech summit opens", "keynotes and demos");
        assert!(!c.matches(&miss, "technology"));
    }

    #[test]
    fn description_is_searched_too() {
        let c = Categorizer::with_defaults();
        let a = article("Quiet Monday", "The championship final went to penalties");
        assert!(c.matches(&a, "sports"));
    }

    #[test]
    fn general_and_unknown_categories_pass_everything() {
        let c = Categorizer::with_defaults();
        let items = vec![article("one", ""), article("two", "")];
        assert_eq!(c.filter(items.clone(), "general").len(), 2);
        assert_eq!(c.filter(items, "no-such-category").len(), 2);
    }

    #[test]
    fn filter_preserves_input_order() {
        let c = Categorizer::with_defaults();
        let items = vec![
            article("Football league results", ""),
            article("Cooking with basil", ""),
            article("Tennis tournament upset", ""),
        ];
        let out = c.filter(items, "sports");
        let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Football league results", "Tennis tournament upset"]
        );
    }
}
