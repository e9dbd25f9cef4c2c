//! Entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist entry content together with explicit/implicit link rows.
//!
//! # Invariants
//! - Link rows of one entry are replaced wholesale on save; the `kind`
//!   column separates authored from derived links.

use crate::model::article::ArticleId;
use crate::model::entry::{Entry, EntryId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

const LINK_KIND_EXPLICIT: &str = "explicit";
const LINK_KIND_IMPLICIT: &str = "implicit";

/// Repository interface for entry aggregates.
pub trait EntryRepository {
    /// Inserts one new entry and returns its stable id.
    fn insert(&self, entry: &Entry) -> RepoResult<EntryId>;
    /// Replaces content and links of an existing entry.
    fn save(&self, entry: &Entry) -> RepoResult<()>;
    /// Loads one entry by id.
    fn get(&self, id: EntryId) -> RepoResult<Option<Entry>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn replace_links(&self, entry: &Entry) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM entry_links WHERE entry_uuid = ?1;",
            [entry.uuid.to_string()],
        )?;
        insert_links(self.conn, entry.uuid, LINK_KIND_EXPLICIT, &entry.explicit_links)?;
        insert_links(self.conn, entry.uuid, LINK_KIND_IMPLICIT, &entry.implicit_links)?;
        Ok(())
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert(&self, entry: &Entry) -> RepoResult<EntryId> {
        self.conn.execute(
            "INSERT INTO entries (uuid, content) VALUES (?1, ?2);",
            params![entry.uuid.to_string(), entry.content.as_str()],
        )?;
        self.replace_links(entry)?;
        Ok(entry.uuid)
    }

    fn save(&self, entry: &Entry) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entries
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![entry.uuid.to_string(), entry.content.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(entry.uuid));
        }
        self.replace_links(entry)?;
        Ok(())
    }

    fn get(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, content FROM entries WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut entry = parse_entry_row(row)?;

        let mut stmt = self.conn.prepare(
            "SELECT kind, phrase, target_uuid
             FROM entry_links
             WHERE entry_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        while let Some(row) = rows.next()? {
            let kind: String = row.get(0)?;
            let phrase: String = row.get(1)?;
            let target_text: String = row.get(2)?;
            let target = parse_uuid(&target_text, "entry_links.target_uuid")?;

            match kind.as_str() {
                LINK_KIND_EXPLICIT => entry.explicit_links.insert(phrase, target),
                LINK_KIND_IMPLICIT => entry.implicit_links.insert(phrase, target),
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid link kind `{other}` in entry_links.kind"
                    )));
                }
            };
        }

        Ok(Some(entry))
    }
}

fn insert_links(
    conn: &Connection,
    entry_uuid: EntryId,
    kind: &str,
    links: &BTreeMap<String, ArticleId>,
) -> RepoResult<()> {
    for (phrase, target) in links {
        conn.execute(
            "INSERT INTO entry_links (entry_uuid, kind, phrase, target_uuid)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                entry_uuid.to_string(),
                kind,
                phrase.as_str(),
                target.to_string()
            ],
        )?;
    }
    Ok(())
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let uuid_text: String = row.get(0)?;
    let uuid = parse_uuid(&uuid_text, "entries.uuid")?;
    let content: String = row.get(1)?;
    Ok(Entry::with_id(uuid, content))
}
