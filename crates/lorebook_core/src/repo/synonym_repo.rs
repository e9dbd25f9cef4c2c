//! Synonym table contract and SQLite implementation.
//!
//! # Responsibility
//! - Store the global `alias phrase -> article` mapping consumed by the
//!   link resolver.
//!
//! # Invariants
//! - The table is an injected dependency, never process-global state.
//! - Aliases are unique; setting an existing alias overwrites its target.

use crate::model::article::ArticleId;
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Capability interface for the global synonym table.
pub trait SynonymTable {
    /// Returns the full alias mapping.
    fn all(&self) -> RepoResult<BTreeMap<String, ArticleId>>;
    /// Inserts or overwrites one alias.
    fn set(&self, alias: &str, target: ArticleId) -> RepoResult<()>;
    /// Removes one alias; removing an unknown alias is a no-op.
    fn remove(&self, alias: &str) -> RepoResult<()>;
}

/// SQLite-backed synonym table.
pub struct SqliteSynonymTable<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSynonymTable<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SynonymTable for SqliteSynonymTable<'_> {
    fn all(&self) -> RepoResult<BTreeMap<String, ArticleId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT alias, article_uuid FROM synonyms;")?;
        let mut rows = stmt.query([])?;

        let mut synonyms = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let alias: String = row.get(0)?;
            let target_text: String = row.get(1)?;
            synonyms.insert(alias, parse_uuid(&target_text, "synonyms.article_uuid")?);
        }
        Ok(synonyms)
    }

    fn set(&self, alias: &str, target: ArticleId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO synonyms (alias, article_uuid)
             VALUES (?1, ?2)
             ON CONFLICT(alias) DO UPDATE SET article_uuid = excluded.article_uuid;",
            params![alias, target.to_string()],
        )?;
        Ok(())
    }

    fn remove(&self, alias: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM synonyms WHERE alias = ?1;", [alias])?;
        Ok(())
    }
}
