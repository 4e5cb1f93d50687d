//! LanceDB vector index
//!
//! On-disk ANN index of embedded document chunks.
//! ref: https://lancedb.github.io/lancedb/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};

use super::vector::{
    distance_to_score, IndexEntry, RetrievedChunk, VectorIndex, EMBEDDING_DIMENSION,
};

/// Default table name
pub const DEFAULT_TABLE: &str = "schemes";

// ============================================================================
// LanceIndex
// ============================================================================

pub struct LanceIndex {
    db: Connection,
    table: String,
}

impl LanceIndex {
    /// Open (or create) the index directory
    ///
    /// # Arguments
    /// * `path` - `.lance` directory
    /// * `table` - table holding the chunks
    pub async fn open(path: &Path, table: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create index directory")?;
            }
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding: {:?}", path))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self {
            db,
            table: table.to_string(),
        })
    }

    /// Open an index that must already exist and contain chunks
    pub async fn open_existing(path: &Path, table: &str) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Vector index not found at {:?}. Build it first with `krishi index --dir <pdfs>`",
                path
            );
        }

        let index = Self::open(path, table).await?;
        if !index.table_exists().await {
            anyhow::bail!("Vector index at {:?} has no '{}' table", path, table);
        }

        Ok(index)
    }

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("page", DataType::Int32, false),
            Field::new("chunk_index", DataType::Int32, false),
            Field::new("chunk_text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    EMBEDDING_DIMENSION,
                ),
                false,
            ),
        ])
    }

    fn entries_to_batch(entries: &[IndexEntry]) -> Result<RecordBatch> {
        if entries.is_empty() {
            anyhow::bail!("Cannot create batch from empty entries");
        }

        if let Some(bad) = entries
            .iter()
            .find(|e| e.embedding.len() != EMBEDDING_DIMENSION as usize)
        {
            anyhow::bail!(
                "Embedding for {} p.{} has {} values, expected {}",
                bad.source,
                bad.page,
                bad.embedding.len(),
                EMBEDDING_DIMENSION
            );
        }

        let sources: Vec<&str> = entries.iter().map(|e| e.source.as_str()).collect();
        let pages: Vec<i32> = entries.iter().map(|e| e.page).collect();
        let chunk_indices: Vec<i32> = entries.iter().map(|e| e.chunk_index).collect();
        let chunk_texts: Vec<&str> = entries.iter().map(|e| e.chunk_text.as_str()).collect();

        let flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings = FixedSizeListArray::try_new(
            field,
            EMBEDDING_DIMENSION,
            Arc::new(Float32Array::from(flat)) as Arc<dyn Array>,
            None,
        )
        .context("Failed to create embedding array")?;

        RecordBatch::try_new(
            Arc::new(Self::schema()),
            vec![
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(pages)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from(chunk_texts)),
                Arc::new(embeddings),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    async fn table_exists(&self) -> bool {
        self.db
            .table_names()
            .execute()
            .await
            .map(|names| names.contains(&self.table))
            .unwrap_or(false)
    }

    async fn open_table(&self) -> Result<lancedb::table::Table> {
        self.db
            .open_table(&self.table)
            .execute()
            .await
            .with_context(|| format!("Failed to open table '{}'", self.table))
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn insert_batch(&self, entries: &[IndexEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = Self::entries_to_batch(entries)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        if self.table_exists().await {
            self.open_table()
                .await?
                .add(batches)
                .execute()
                .await
                .context("Failed to add chunks to table")?;
        } else {
            self.db
                .create_table(&self.table, batches)
                .execute()
                .await
                .context("Failed to create table")?;
        }

        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>> {
        if !self.table_exists().await {
            return Ok(vec![]);
        }

        let stream = self
            .open_table()
            .await?
            .vector_search(query_embedding.to_vec())
            .context("Failed to create vector search")?
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = stream.try_collect().await?;
        let mut results = Vec::new();

        for batch in batches {
            let sources = string_column(&batch, "source")?;
            let pages = batch
                .column_by_name("page")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing page column"))?;
            let texts = string_column(&batch, "chunk_text")?;
            // added by LanceDB
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing _distance column"))?;

            for i in 0..batch.num_rows() {
                results.push(RetrievedChunk {
                    source: sources.value(i).to_string(),
                    page: pages.value(i),
                    chunk_text: texts.value(i).to_string(),
                    score: distance_to_score(distances.value(i)),
                });
            }
        }

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        if !self.table_exists().await {
            return Ok(0);
        }

        self.open_table()
            .await?
            .count_rows(None)
            .await
            .context("Failed to count rows")
    }

    async fn clear(&self) -> Result<()> {
        if self.table_exists().await {
            self.db
                .drop_table(&self.table)
                .await
                .with_context(|| format!("Failed to drop table '{}'", self.table))?;
            tracing::info!("Dropped index table '{}'", self.table);
        }
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Missing {} column", name))
}

// ============================================================================
// Tests
// ============================================================================
