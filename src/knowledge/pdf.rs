//! PDF text extraction (pdf-extract)

use std::path::Path;

use anyhow::{Context, Result};

/// Extract text per page as `(page_number, text)`; pages start at 1
pub fn extract_pages(path: &Path) -> Result<Vec<(usize, String)>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(vec![]);
    }

    Ok(split_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| (i + 1, page))
        .collect())
}

/// Split on form feeds; blank pages are dropped
fn split_pages(text: &str) -> Vec<String> {
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.is_empty() {
        vec![text.trim().to_string()]
    } else {
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_with_formfeed() {
        let pages = split_pages("Scheme overview\x0cEligibility\x0c\x0cHow to apply");
        assert_eq!(pages, vec!["Scheme overview", "Eligibility", "How to apply"]);
    }

    #[test]
    fn test_split_pages_single() {
        let pages = split_pages("  Just one page  ");
        assert_eq!(pages, vec!["Just one page"]);
    }

    #[test]
    fn test_extract_missing_file() {
        assert!(extract_pages(Path::new("/nonexistent/schemes.pdf")).is_err());
    }
}
