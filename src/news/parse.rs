//! HTML extraction for the news scraper (no network I/O)

use scraper::{Html, Selector};
use url::Url;

/// Anchors taken per seed page
pub const MAX_LINKS_PER_SITE: usize = 5;

const KEYWORDS: [&str; 2] = ["agriculture", "farming"];

/// Whether visible anchor text mentions a keyword (case-insensitive)
pub fn is_agri_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Matching article links on a seed page, resolved against `base`
///
/// Only the first [`MAX_LINKS_PER_SITE`] matching anchors are considered;
/// duplicates among them are dropped.
pub fn extract_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return vec![];
    };

    let mut links: Vec<String> = Vec::new();

    let matching = document
        .select(&selector)
        .filter(|a| is_agri_text(&a.text().collect::<String>()))
        .take(MAX_LINKS_PER_SITE);

    for anchor in matching {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        match base.join(href.trim()) {
            Ok(url) => {
                let url = url.to_string();
                if !links.contains(&url) {
                    links.push(url);
                }
            }
            Err(e) => tracing::debug!("Skipping unresolvable href '{}': {}", href, e),
        }
    }

    links
}

/// Runs of whitespace (newlines in `<title>` included) become one space
fn collapse_whitespace(text: &str) -> String {
    match regex::Regex::new(r"\s+") {
        Ok(re) => re.replace_all(text.trim(), " ").into_owned(),
        Err(_) => text.trim().to_string(),
    }
}

/// `<title>` text, trimmed; `None` only when the tag is missing
pub fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
}

/// `<meta name="description" content="...">`, trimmed; `None` only when
/// the tag or its `content` is missing
pub fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(collapse_whitespace)
}
