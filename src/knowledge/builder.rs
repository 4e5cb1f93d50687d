//! Index builder - source documents -> embedded chunks in the vector index
//!
//! Offline step; the assistants only read what this writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::embedding::EmbeddingProvider;

use super::chunker::Chunker;
use super::pdf;
use super::vector::{IndexEntry, VectorIndex};

// ============================================================================
// Source Documents
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Text,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "txt" | "md" => Some(SourceKind::Text),
            _ => None,
        }
    }
}

/// Supported files under `dir`, sorted by path (respects .gitignore)
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(dir).hidden(true).git_ignore(true).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && SourceKind::from_path(path).is_some() {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

// ============================================================================
// IndexBuilder
// ============================================================================

/// Per-run summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub files_indexed: usize,
    pub files_failed: usize,
    pub pages: usize,
    pub chunks: usize,
}

pub struct IndexBuilder {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Box<dyn Chunker>,
}

impl IndexBuilder {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Box<dyn Chunker>,
    ) -> Self {
        Self {
            index,
            embedder,
            chunker,
        }
    }

    /// Drop everything currently in the index
    pub async fn reset(&self) -> Result<()> {
        self.index.clear().await
    }

    /// Index a list of files; one failing file does not stop the run
    pub async fn build(&self, files: &[PathBuf]) -> Result<BuildStats> {
        let mut stats = BuildStats::default();

        for (i, path) in files.iter().enumerate() {
            tracing::info!("[{}/{}] Indexing {:?}", i + 1, files.len(), path);

            match self.index_file(path).await {
                Ok((pages, chunks)) => {
                    stats.files_indexed += 1;
                    stats.pages += pages;
                    stats.chunks += chunks;
                }
                Err(e) => {
                    tracing::warn!("Failed to index {:?}: {:#}", path, e);
                    stats.files_failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Returns `(pages, chunks)` written for one file
    pub async fn index_file(&self, path: &Path) -> Result<(usize, usize)> {
        let kind = SourceKind::from_path(path)
            .ok_or_else(|| anyhow::anyhow!("Unsupported file type: {:?}", path))?;

        let pages = read_pages(path, kind).await?;
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut entries = Vec::new();
        for (page, text) in &pages {
            let chunks = self.chunker.chunk(text);
            let embeddings = self
                .embedder
                .embed_documents(&chunks)
                .await
                .with_context(|| format!("Failed to embed {} page {}", source, page))?;

            for (chunk_index, (chunk_text, embedding)) in
                chunks.into_iter().zip(embeddings).enumerate()
            {
                entries.push(IndexEntry {
                    source: source.clone(),
                    page: *page as i32,
                    chunk_index: chunk_index as i32,
                    chunk_text,
                    embedding,
                });
            }
        }

        if entries.is_empty() {
            tracing::warn!("No text chunks produced for {:?}", path);
            return Ok((pages.len(), 0));
        }

        let written = self
            .index
            .insert_batch(&entries)
            .await
            .context("Failed to write chunks to index")?;

        tracing::debug!("{}: {} pages, {} chunks", source, pages.len(), written);
        Ok((pages.len(), written))
    }
}

async fn read_pages(path: &Path, kind: SourceKind) -> Result<Vec<(usize, String)>> {
    match kind {
        SourceKind::Text => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read text file: {:?}", path))?;
            Ok(vec![(1, text)])
        }
        // CPU-bound
        SourceKind::Pdf => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf::extract_pages(&path))
                .await
                .context("PDF extraction task failed")?
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
