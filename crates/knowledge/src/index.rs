//! SQLite-backed vector index.
//!
//! One database file holds any number of named collections. Each record
//! stores its embedding as a little-endian `f32` blob; search is a full
//! scan of the collection scored by cosine distance.

use crate::embeddings::{EmbeddingClient, EmbeddingConfig};
use crate::types::{AddReport, Chunk, ChunkMetadata, IndexStats, IndexedRecord, IngestMode, RetrievalResult};
use chrono::Utc;
use medrag_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Records per insert transaction.
pub const INSERT_BATCH_SIZE: usize = 100;

/// Handle on one collection of an index file.
///
/// The connection sits behind a mutex so the handle can be shared through
/// an `Arc`. Every `add` batch, `clear` and `search` takes the lock on its
/// own, so a reader running during a rebuild can see partial contents.
#[derive(Debug)]
pub struct VectorIndex {
    conn: Mutex<Connection>,
    path: PathBuf,
    name: String,
    embedder: Arc<EmbeddingClient>,
}

impl VectorIndex {
    /// Open (creating if needed) collection `name` in the database at `path`.
    pub fn open(path: &Path, name: &str, embedder: Arc<EmbeddingClient>) -> AppResult<Self> {
        if name.trim().is_empty() {
            return Err(AppError::Index("Collection name must not be empty".to_string()));
        }

        let conn = init_index(path)?;
        let index = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            name: name.to_string(),
            embedder,
        };

        {
            let conn = index.lock()?;
            if index.stored_schema(&conn)?.is_none() {
                index.register_collection(&conn)?;
                tracing::info!("Created collection '{}' in {:?}", name, path);
            }
        }

        tracing::debug!(
            collection = %index.name,
            model = %index.embedder.model_name(),
            dims = index.embedder.dimensions(),
            "Opened vector index"
        );

        Ok(index)
    }

    /// Release the underlying connection.
    pub fn close(self) -> AppResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| AppError::Index("Index lock poisoned".to_string()))?;
        conn.close()
            .map_err(|(_, e)| AppError::Index(format!("Failed to close index: {}", e)))?;
        tracing::debug!("Closed collection '{}'", self.name);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn embedder(&self) -> &EmbeddingClient {
        &self.embedder
    }

    /// Embed and insert `chunks`.
    ///
    /// `Replace` clears the collection first. `Append` keeps existing
    /// records; chunks with an existing id overwrite the stored record.
    /// An empty `chunks` leaves the collection untouched in either mode.
    pub async fn add(&self, chunks: &[Chunk], mode: IngestMode) -> AppResult<AddReport> {
        if chunks.is_empty() {
            tracing::warn!(collection = %self.name, "No chunks to add, collection left unchanged");
            return Ok(AddReport::default());
        }

        match mode {
            IngestMode::Replace => self.clear()?,
            IngestMode::Append => {
                let conn = self.lock()?;
                self.check_compatible(&conn)?;
            }
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embedded = self.embedder.embed(&texts).await;

        let ids = assign_ids(chunks);
        let records: Vec<IndexedRecord> = chunks
            .iter()
            .zip(ids)
            .zip(embedded.vectors)
            .enumerate()
            .map(|(i, ((chunk, id), embedding))| IndexedRecord {
                id,
                embedding,
                content: chunk.content.clone(),
                metadata: ChunkMetadata::from(chunk),
                content_hash: content_hash(&chunk.content),
                degraded: embedded.failures.iter().any(|f| i >= f.start && i < f.start + f.len),
            })
            .collect();

        let mut inserted = 0;
        for batch in records.chunks(INSERT_BATCH_SIZE) {
            inserted += self.insert_batch(batch)?;
            tracing::debug!("Inserted {}/{} records", inserted, records.len());
        }

        let written = records.iter().map(|r| r.id.as_str()).collect::<HashSet<_>>().len();
        if written < inserted {
            tracing::warn!(
                collection = %self.name,
                duplicates = inserted - written,
                "Chunks with duplicate ids overwrote each other"
            );
        }

        let degraded = records.iter().filter(|r| r.degraded).count();
        if degraded > 0 {
            tracing::warn!(
                collection = %self.name,
                degraded,
                "Some records were stored with zero-vector embeddings and are excluded from search"
            );
        }

        Ok(AddReport {
            records_written: written,
            degraded_records: degraded,
            embedding_failures: embedded.failures,
        })
    }

    /// Embed `query` and return the `k` nearest records, nearest first.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_query(query).await?;
        self.search_embedding(&embedding, k)
    }

    /// Nearest-neighbor query with a precomputed embedding.
    ///
    /// Degraded records are skipped.
    pub fn search_embedding(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        self.check_compatible(&conn)?;

        if embedding.len() != self.embedder.dimensions() {
            return Err(AppError::Index(format!(
                "Query embedding has {} dimensions, collection '{}' expects {}",
                embedding.len(),
                self.name,
                self.embedder.dimensions()
            )));
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, content, title, url, sequence_index, token_count, embedding
                 FROM records WHERE collection = ?1 AND degraded = 0",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.name], |row| {
                let bytes: Vec<u8> = row.get(6)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    ChunkMetadata {
                        title: row.get(2)?,
                        url: row.get(3)?,
                        sequence_index: row.get::<_, i64>(4)? as usize,
                        token_count: row.get::<_, i64>(5)? as usize,
                    },
                    bytes,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to query records: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, content, metadata, bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read record: {}", e)))?;
            let stored = bytes_to_embedding(&bytes)?;
            let distance = cosine_distance(embedding, &stored);
            results.push(RetrievalResult {
                id,
                content,
                metadata,
                distance,
                relevance_score: relevance_from_distance(distance),
            });
        }

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!(
            collection = %self.name,
            hits = results.len(),
            best = ?results.first().map(|r| r.relevance_score),
            "Vector search complete"
        );

        Ok(results)
    }

    /// Retrievable and degraded record counts of the collection.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let conn = self.lock()?;
        collection_stats(&conn, &self.name)
    }

    /// Delete the collection and recreate it empty under the same name,
    /// bound to the current embedding model.
    pub fn clear(&self) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM records WHERE collection = ?1", params![self.name])
            .map_err(|e| AppError::Index(format!("Failed to delete records: {}", e)))?;
        tx.execute("DELETE FROM collections WHERE name = ?1", params![self.name])
            .map_err(|e| AppError::Index(format!("Failed to delete collection: {}", e)))?;
        self.register_collection(&tx)?;

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit clear: {}", e)))?;

        tracing::info!("Cleared collection '{}'", self.name);
        Ok(())
    }

    /// Fetch one record by id.
    pub fn get(&self, id: &str) -> AppResult<Option<IndexedRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, content, title, url, sequence_index, token_count, embedding,
                        content_hash, degraded
                 FROM records WHERE collection = ?1 AND id = ?2",
                params![self.name, id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        ChunkMetadata {
                            title: row.get(2)?,
                            url: row.get(3)?,
                            sequence_index: row.get::<_, i64>(4)? as usize,
                            token_count: row.get::<_, i64>(5)? as usize,
                        },
                        row.get::<_, Vec<u8>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, bool>(8)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AppError::Index(format!("Failed to load record: {}", e)))?;

        match row {
            Some((id, content, metadata, bytes, content_hash, degraded)) => Ok(Some(IndexedRecord {
                id,
                embedding: bytes_to_embedding(&bytes)?,
                content,
                metadata,
                content_hash,
                degraded,
            })),
            None => Ok(None),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("Index lock poisoned".to_string()))
    }

    fn insert_batch(&self, records: &[IndexedRecord]) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO records
                     (collection, id, content, content_hash, title, url, sequence_index,
                      token_count, embedding, degraded, indexed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .map_err(|e| AppError::Index(format!("Failed to prepare insert: {}", e)))?;

            for record in records {
                stmt.execute(params![
                    self.name,
                    record.id,
                    record.content,
                    record.content_hash,
                    record.metadata.title,
                    record.metadata.url,
                    record.metadata.sequence_index as i64,
                    record.metadata.token_count as i64,
                    embedding_to_bytes(&record.embedding),
                    record.degraded,
                    now,
                ])
                .map_err(|e| AppError::Index(format!("Failed to insert record: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit records: {}", e)))?;

        Ok(records.len())
    }

    fn register_collection(&self, conn: &Connection) -> AppResult<()> {
        conn.execute(
            "INSERT INTO collections (name, embedding_model, dimensions, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.name,
                self.embedder.model_name(),
                self.embedder.dimensions() as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to register collection: {}", e)))?;
        Ok(())
    }

    fn stored_schema(&self, conn: &Connection) -> AppResult<Option<(String, usize)>> {
        conn.query_row(
            "SELECT embedding_model, dimensions FROM collections WHERE name = ?1",
            params![self.name],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)),
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to read collection: {}", e)))
    }

    /// Vectors stored under another model or size are not comparable with
    /// the current embedder's. A `Replace` ingest or `clear` resets this.
    fn check_compatible(&self, conn: &Connection) -> AppResult<()> {
        let Some((model, dimensions)) = self.stored_schema(conn)? else {
            return self.register_collection(conn);
        };

        let stored = EmbeddingConfig {
            model,
            dimensions,
            ..self.embedder.config().clone()
        };
        stored.validate_consistency(self.embedder.config())
    }
}

/// Bulk-load `chunks` into `index`.
pub async fn build_index(
    index: &VectorIndex,
    chunks: &[Chunk],
    mode: IngestMode,
) -> AppResult<AddReport> {
    tracing::info!(
        collection = %index.name(),
        chunks = chunks.len(),
        mode = ?mode,
        "Building index"
    );

    let report = index.add(chunks, mode).await?;

    tracing::info!(
        collection = %index.name(),
        written = report.records_written,
        degraded = report.degraded_records,
        "Index build complete"
    );

    Ok(report)
}

/// Stats of a collection without opening an embedding-bound handle.
///
/// A missing index file reads as an empty collection.
pub fn read_stats(db_path: &Path, name: &str) -> AppResult<IndexStats> {
    if !db_path.exists() {
        return Ok(IndexStats {
            total_documents: 0,
            degraded_records: 0,
            collection_name: name.to_string(),
        });
    }

    let conn = init_index(db_path)?;
    collection_stats(&conn, name)
}

fn collection_stats(conn: &Connection, collection: &str) -> AppResult<IndexStats> {
    let (searchable, degraded): (i64, i64) = conn
        .query_row(
            "SELECT COALESCE(SUM(degraded = 0), 0), COALESCE(SUM(degraded != 0), 0)
             FROM records WHERE collection = ?1",
            params![collection],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| AppError::Index(format!("Failed to count records: {}", e)))?;
    Ok(IndexStats {
        total_documents: searchable as usize,
        degraded_records: degraded as usize,
        collection_name: collection.to_string(),
    })
}

/// Open the SQLite file, creating parent directories and tables.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            embedding_model TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            content TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            sequence_index INTEGER NOT NULL,
            token_count INTEGER NOT NULL,
            embedding BLOB NOT NULL,
            degraded INTEGER NOT NULL DEFAULT 0,
            indexed_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        "#,
    )
    .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Stable key: 16 hex chars of `sha256(title \n url)`, then `#<sequence_index>`.
///
/// `occurrence` counts earlier documents in the same batch with the same
/// title and url; from the second such document on it is mixed into the
/// digest so their chunks get keys of their own.
pub fn record_id(title: &str, url: &str, occurrence: usize, sequence_index: usize) -> String {
    let source = if occurrence == 0 {
        format!("{}\n{}", title, url)
    } else {
        format!("{}\n{}\n{}", title, url, occurrence)
    };
    let digest = format!("{:x}", Sha256::digest(source.as_bytes()));
    format!("{}#{}", &digest[..16], sequence_index)
}

/// Record ids for a batch of chunks in document order.
///
/// A chunk with `sequence_index == 0` starts a new document.
fn assign_ids(chunks: &[Chunk]) -> Vec<String> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    chunks
        .iter()
        .map(|chunk| {
            let key = (chunk.title.as_str(), chunk.url.as_str());
            let occurrence = if chunk.sequence_index == 0 {
                let count = seen.entry(key).or_insert(0);
                *count += 1;
                *count - 1
            } else {
                seen.get(&key).map_or(0, |count| count.saturating_sub(1))
            };
            record_id(&chunk.title, &chunk.url, occurrence, chunk.sequence_index)
        })
        .collect()
}

pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// `1 - cos(a, b)`; zero-norm or mismatched vectors count as orthogonal.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Map a cosine distance in `[0, 2]` onto `[0, 1]`.
pub fn relevance_from_distance(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index("Invalid embedding bytes length".to_string()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
