use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::entity::Prompt;
use crate::error::{PromptshelfError, Result};

const CACHE_DB: &str = "cache.db";

/// SQLite cache for full-text search over prompts
pub struct SqliteCache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteCache {
    /// Open or create the cache database inside a `.promptshelf` directory
    pub fn open(shelf_dir: &Path) -> Result<Self> {
        let path = shelf_dir.join(CACHE_DB);
        let conn = Connection::open(&path)?;

        let cache = Self {
            conn,
            path: Some(path),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// A cache that lives only as long as the process
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn, path: None };
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS prompts (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT,
                prompt_type TEXT,
                tags TEXT,
                favorite INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS prompts_fts USING fts5(
                id,
                title,
                content,
                category,
                prompt_type,
                tags,
                content='prompts',
                content_rowid='rowid'
            )",
            [],
        )?;

        // Keep the FTS index in step with the prompts table
        self.conn.execute_batch(
            "
            CREATE TRIGGER IF NOT EXISTS prompts_ai AFTER INSERT ON prompts BEGIN
                INSERT INTO prompts_fts(rowid, id, title, content, category, prompt_type, tags)
                VALUES (new.rowid, new.id, new.title, new.content, new.category, new.prompt_type, new.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS prompts_ad AFTER DELETE ON prompts BEGIN
                INSERT INTO prompts_fts(prompts_fts, rowid, id, title, content, category, prompt_type, tags)
                VALUES ('delete', old.rowid, old.id, old.title, old.content, old.category, old.prompt_type, old.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS prompts_au AFTER UPDATE ON prompts BEGIN
                INSERT INTO prompts_fts(prompts_fts, rowid, id, title, content, category, prompt_type, tags)
                VALUES ('delete', old.rowid, old.id, old.title, old.content, old.category, old.prompt_type, old.tags);
                INSERT INTO prompts_fts(rowid, id, title, content, category, prompt_type, tags)
                VALUES (new.rowid, new.id, new.title, new.content, new.category, new.prompt_type, new.tags);
            END;
            ",
        )?;

        Ok(())
    }

    /// Store version the cache was last built from
    pub fn get_store_version(&self) -> Result<Option<String>> {
        let result: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'store_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    pub fn set_store_version(&self, version: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('store_version', ?1)",
            [version],
        )?;
        Ok(())
    }

    /// Index a prompt, replacing any previous entry for it
    pub fn index_prompt(&self, prompt: &Prompt) -> Result<()> {
        let id = prompt.id.to_string();
        self.remove_prompt(&id)?;

        self.conn.execute(
            "INSERT INTO prompts
             (id, sequence_number, title, content, category, prompt_type, tags, favorite, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                prompt.sequence_number,
                prompt.title,
                prompt.content,
                prompt.category,
                prompt.prompt_type,
                prompt.tags.join(", "),
                prompt.favorite,
                prompt.created_at.to_rfc3339(),
                prompt.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn remove_prompt(&self, id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM prompts WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Clear all cached data (for full rebuild)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM prompts", [])?;
        self.conn.execute("DELETE FROM meta", [])?;
        Ok(())
    }

    /// Run an FTS5 MATCH expression against the prompt index.
    ///
    /// The expression is passed through as-is; callers are expected to quote
    /// user input (see [`crate::search::fts_query`]).
    pub fn search_prompts(&self, match_expr: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.sequence_number, p.title, p.favorite,
                    highlight(prompts_fts, 1, '<mark>', '</mark>') as title_highlight,
                    snippet(prompts_fts, 2, '<mark>', '</mark>', '...', 32) as content_snippet
             FROM prompts_fts f
             JOIN prompts p ON p.id = f.id
             WHERE prompts_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let results = stmt
            .query_map(params![match_expr, limit as i64], |row| {
                Ok(SearchResult {
                    id: row.get(0)?,
                    sequence_number: row.get(1)?,
                    title: row.get(2)?,
                    favorite: row.get(3)?,
                    title_highlight: row.get(4)?,
                    content_snippet: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Rebuild the index when the store has moved on.
    /// Returns true if a full reindex was performed
    pub fn sync_from_store(&self, prompts: &[Prompt], store_version: &str) -> Result<bool> {
        let stored_version = self.get_store_version()?;

        if stored_version.as_deref() == Some(store_version) {
            return Ok(false);
        }

        self.clear()?;
        for prompt in prompts {
            self.index_prompt(prompt)?;
        }
        self.set_store_version(store_version)?;

        tracing::debug!(count = prompts.len(), version = store_version, "reindexed prompt cache");
        Ok(true)
    }
}

/// Search result from full-text search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub sequence_number: u32,
    pub title: String,
    pub favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
}

impl From<rusqlite::Error> for PromptshelfError {
    fn from(e: rusqlite::Error) -> Self {
        PromptshelfError::Storage(format!("SQLite error: {}", e))
    }
}
