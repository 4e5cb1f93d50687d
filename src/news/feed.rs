//! News CSV - the only hand-off between the scraper and the news viewer

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use super::NewsArticle;

/// Articles per page in the viewer
pub const PAGE_SIZE: usize = 5;

/// Overwrite `path` with a `Link,Title,Desc` CSV
pub fn write_articles(path: &Path, articles: &[NewsArticle]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open news file: {}", path.display()))?;

    // explicit header so an empty run still yields a valid file
    writer.write_record(["Link", "Title", "Desc"])?;
    for article in articles {
        writer.write_record([&article.link, &article.title, &article.description])?;
    }
    writer.flush()?;

    tracing::info!("Saved {} articles to {}", articles.len(), path.display());
    Ok(())
}

/// Read the saved feed; a missing file is an empty feed
pub fn read_articles(path: &Path) -> Result<Vec<NewsArticle>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open news file: {}", path.display()))?;

    let mut articles = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed row in news file")?;
        articles.push(NewsArticle {
            link: record.get(0).unwrap_or_default().to_string(),
            title: record.get(1).unwrap_or_default().to_string(),
            description: record.get(2).unwrap_or_default().to_string(),
        });
    }

    Ok(articles)
}

/// Modification time of the feed, if it exists
pub fn last_updated(path: &Path) -> Option<DateTime<Local>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified))
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// 1-based, clamped to `1..=total_pages`
    pub number: usize,
    pub total_pages: usize,
    pub items: &'a [NewsArticle],
}

/// Slice one page out of the feed; out-of-range pages are clamped
pub fn paginate(articles: &[NewsArticle], page: usize, per_page: usize) -> Page<'_> {
    let per_page = per_page.max(1);
    let total_pages = articles.len().div_ceil(per_page).max(1);
    let number = page.clamp(1, total_pages);

    let start = (number - 1) * per_page;
    let end = (start + per_page).min(articles.len());

    Page {
        number,
        total_pages,
        items: &articles[start.min(end)..end],
    }
}
