//! Class label file loading

use std::path::Path;

use anyhow::{Context, Result};

/// Ordered class labels; position equals model output index
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Load a label file (one label per line)
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label file: {:?}", path))?;

        let labels = Self::parse(&text);
        if labels.is_empty() {
            anyhow::bail!("Label file is empty: {:?}", path);
        }

        tracing::debug!("Loaded {} labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    /// Parse label text. A leading class index (`0 Apple Rust Leaf`) is stripped.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(strip_index)
            .collect();

        Self { names }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

fn strip_index(line: &str) -> String {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) if head.chars().all(|c| c.is_ascii_digit()) && !rest.trim().is_empty() => {
            rest.trim().to_string()
        }
        _ => line.to_string(),
    }
}
