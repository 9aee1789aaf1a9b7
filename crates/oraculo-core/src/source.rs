use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;

use crate::types::FaqDocument;

/// Where FAQ entries come from. Invoked at startup and on every reload; the
/// engine builds a fresh corpus from whatever this returns.
pub trait CorpusSource: Send + Sync {
    fn load_documents(&self) -> Result<Vec<FaqDocument>>;
}

/// Reads the whole corpus from a single JSON array file (`faq.json`).
pub struct JsonCorpusSource {
    path: PathBuf,
}

impl JsonCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for JsonCorpusSource {
    fn load_documents(&self) -> Result<Vec<FaqDocument>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read corpus file: {:?}", self.path))?;
        let docs: Vec<FaqDocument> =
            serde_json::from_str(&content).context("Failed to parse corpus JSON")?;
        Ok(docs)
    }
}

/// SQLite-backed FAQ store. Holds the `faq_items` table the ingest command
/// writes into; `load_documents` returns active rows only.
pub struct SqliteCorpusSource {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCorpusSource {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(path).context("Failed to open FAQ database")?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS faq_items (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                intent TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                language TEXT NOT NULL DEFAULT 'es',
                source_link TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                embedding BLOB,
                content_hash TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_faq_items_intent ON faq_items(intent);",
        )
        .context("Failed to initialize faq_items table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Insert or update one entry. Returns true when the row actually
    /// changed (used by ingest to skip re-embedding unchanged entries).
    pub fn upsert(&self, doc: &FaqDocument, content_hash: &str) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT content_hash FROM faq_items WHERE id = ?1",
                params![doc.id],
                |row| row.get(0),
            )
            .ok();
        if existing.as_deref() == Some(content_hash) {
            return Ok(false);
        }

        let tags = serde_json::to_string(&doc.tags).context("Failed to serialize tags")?;
        let embedding = doc.embedding.as_ref().map(|e| embedding_to_bytes(e));
        conn.execute(
            "INSERT INTO faq_items
                (id, question, answer, intent, tags, language, source_link,
                 is_active, embedding, content_hash, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                intent = excluded.intent,
                tags = excluded.tags,
                language = excluded.language,
                source_link = excluded.source_link,
                is_active = excluded.is_active,
                embedding = excluded.embedding,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at",
            params![
                doc.id,
                doc.question,
                doc.answer,
                doc.intent,
                tags,
                doc.language,
                doc.source_link,
                doc.is_active,
                embedding,
                content_hash,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to upsert FAQ entry")?;

        Ok(true)
    }

    /// Stored content hash for an entry, if present. Lets ingest skip
    /// re-embedding entries that have not changed.
    pub fn content_hash(&self, id: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let mut stmt = conn.prepare("SELECT content_hash FROM faq_items WHERE id = ?1")?;
        let result = stmt
            .query_row(params![id], |row| row.get::<_, String>(0))
            .ok();
        Ok(result)
    }

    /// Soft-delete: flips is_active so the next reload drops the entry.
    pub fn deactivate(&self, id: &str) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let rows = conn.execute(
            "UPDATE faq_items SET is_active = 0 WHERE id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    pub fn count_active(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM faq_items WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl CorpusSource for SqliteCorpusSource {
    fn load_documents(&self) -> Result<Vec<FaqDocument>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT id, question, answer, intent, tags, language, source_link,
                    is_active, embedding
             FROM faq_items
             WHERE is_active = 1
             ORDER BY id",
        )?;

        let docs = stmt
            .query_map([], |row| {
                let tags_json: String = row.get(4)?;
                let embedding_blob: Option<Vec<u8>> = row.get(8)?;
                Ok(FaqDocument {
                    id: row.get(0)?,
                    question: row.get(1)?,
                    answer: row.get(2)?,
                    intent: row.get(3)?,
                    tags: serde_json::from_str(&tags_json).unwrap_or_default(),
                    language: row.get(5)?,
                    source_link: row.get(6)?,
                    is_active: row.get(7)?,
                    embedding: embedding_blob.as_deref().map(bytes_to_embedding),
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect FAQ rows")?;

        info!(count = docs.len(), db = ?self.db_path, "Loaded FAQ entries");
        Ok(docs)
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
