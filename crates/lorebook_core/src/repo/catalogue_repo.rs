//! Catalogue repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the catalogue forest with its ordered child/article rows.
//! - Apply multi-aggregate write batches in one transaction.
//!
//! # Invariants
//! - `sort_order` rows are written densely from `OrderedReferenceMap`.
//! - A committed batch is all-or-nothing: a reparent or a fold-on-delete
//!   never leaves a half-applied parent/child pair behind.

use crate::db::migrations::latest_version;
use crate::model::catalogue::{Catalogue, CatalogueId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Ordered set of catalogue writes applied atomically.
#[derive(Debug, Clone, Default)]
pub struct CatalogueWriteBatch {
    saves: Vec<Catalogue>,
    deletes: Vec<CatalogueId>,
}

impl CatalogueWriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an upsert of one catalogue aggregate.
    pub fn save(&mut self, catalogue: Catalogue) -> &mut Self {
        self.saves.push(catalogue);
        self
    }

    /// Queues a hard delete. Deletes run after all saves.
    pub fn delete(&mut self, id: CatalogueId) -> &mut Self {
        self.deletes.push(id);
        self
    }

    /// Returns whether the batch carries no writes.
    pub fn is_empty(&self) -> bool {
        self.saves.is_empty() && self.deletes.is_empty()
    }
}

/// Repository interface for catalogue aggregates.
pub trait CatalogueRepository {
    /// Loads one catalogue by id.
    fn get(&self, id: CatalogueId) -> RepoResult<Option<Catalogue>>;
    /// Loads one catalogue by its globally unique title.
    fn get_by_title(&self, title: &str) -> RepoResult<Option<Catalogue>>;
    /// Lists root catalogues, ordered by title then id.
    fn list_roots(&self) -> RepoResult<Vec<Catalogue>>;
    /// Applies all writes of the batch in one transaction.
    fn commit(&self, batch: &CatalogueWriteBatch) -> RepoResult<()>;
}

/// SQLite-backed catalogue repository.
pub struct SqliteCatalogueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogueRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogueRepository for SqliteCatalogueRepository<'_> {
    fn get(&self, id: CatalogueId) -> RepoResult<Option<Catalogue>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, title, parent_uuid FROM catalogues WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let header = parse_catalogue_row(row)?;
            return Ok(Some(load_ordered_refs(self.conn, header)?));
        }
        Ok(None)
    }

    fn get_by_title(&self, title: &str) -> RepoResult<Option<Catalogue>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, title, parent_uuid FROM catalogues WHERE title = ?1;")?;
        let mut rows = stmt.query([title])?;
        if let Some(row) = rows.next()? {
            let header = parse_catalogue_row(row)?;
            return Ok(Some(load_ordered_refs(self.conn, header)?));
        }
        Ok(None)
    }

    fn list_roots(&self) -> RepoResult<Vec<Catalogue>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, parent_uuid
             FROM catalogues
             WHERE parent_uuid IS NULL
             ORDER BY title ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;

        let mut roots = Vec::new();
        while let Some(row) = rows.next()? {
            let header = parse_catalogue_row(row)?;
            roots.push(load_ordered_refs(self.conn, header)?);
        }
        Ok(roots)
    }

    fn commit(&self, batch: &CatalogueWriteBatch) -> RepoResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for catalogue in &batch.saves {
            save_catalogue(&tx, catalogue)?;
        }
        for id in &batch.deletes {
            delete_catalogue(&tx, *id)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn save_catalogue(conn: &Connection, catalogue: &Catalogue) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO catalogues (uuid, title, parent_uuid)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(uuid) DO UPDATE SET
             title = excluded.title,
             parent_uuid = excluded.parent_uuid,
             updated_at = (strftime('%s', 'now') * 1000);",
        params![
            catalogue.uuid.to_string(),
            catalogue.title.as_str(),
            catalogue.parent_uuid.map(|value| value.to_string()),
        ],
    )?;

    conn.execute(
        "DELETE FROM catalogue_children WHERE parent_uuid = ?1;",
        [catalogue.uuid.to_string()],
    )?;
    for (order, child_uuid) in catalogue.children.in_order().into_iter().enumerate() {
        conn.execute(
            "INSERT INTO catalogue_children (parent_uuid, child_uuid, sort_order)
             VALUES (?1, ?2, ?3);",
            params![
                catalogue.uuid.to_string(),
                child_uuid.to_string(),
                order as i64
            ],
        )?;
    }

    conn.execute(
        "DELETE FROM catalogue_articles WHERE catalogue_uuid = ?1;",
        [catalogue.uuid.to_string()],
    )?;
    for (order, article_uuid) in catalogue.articles.in_order().into_iter().enumerate() {
        conn.execute(
            "INSERT INTO catalogue_articles (catalogue_uuid, article_uuid, sort_order)
             VALUES (?1, ?2, ?3);",
            params![
                catalogue.uuid.to_string(),
                article_uuid.to_string(),
                order as i64
            ],
        )?;
    }

    Ok(())
}

fn delete_catalogue(conn: &Connection, id: CatalogueId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM catalogues WHERE uuid = ?1;", [id.to_string()])?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn parse_catalogue_row(row: &Row<'_>) -> RepoResult<Catalogue> {
    let uuid_text: String = row.get(0)?;
    let uuid = parse_uuid(&uuid_text, "catalogues.uuid")?;

    let title: String = row.get(1)?;
    let parent_uuid = row
        .get::<_, Option<String>>(2)?
        .map(|value| parse_uuid(&value, "catalogues.parent_uuid"))
        .transpose()?;

    let mut catalogue = Catalogue::with_id(uuid, title);
    catalogue.parent_uuid = parent_uuid;
    Ok(catalogue)
}

fn load_ordered_refs(conn: &Connection, mut catalogue: Catalogue) -> RepoResult<Catalogue> {
    let mut stmt = conn.prepare(
        "SELECT child_uuid
         FROM catalogue_children
         WHERE parent_uuid = ?1
         ORDER BY sort_order ASC, child_uuid ASC;",
    )?;
    let mut rows = stmt.query([catalogue.uuid.to_string()])?;
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let child = parse_uuid(&value, "catalogue_children.child_uuid")?;
        catalogue.children.append(child).map_err(|err| {
            RepoError::InvalidData(format!("catalogue_children for {}: {err}", catalogue.uuid))
        })?;
    }

    let mut stmt = conn.prepare(
        "SELECT article_uuid
         FROM catalogue_articles
         WHERE catalogue_uuid = ?1
         ORDER BY sort_order ASC, article_uuid ASC;",
    )?;
    let mut rows = stmt.query([catalogue.uuid.to_string()])?;
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let article = parse_uuid(&value, "catalogue_articles.article_uuid")?;
        catalogue.articles.append(article).map_err(|err| {
            RepoError::InvalidData(format!("catalogue_articles for {}: {err}", catalogue.uuid))
        })?;
    }

    Ok(catalogue)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
