//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist article aggregates with ordered entry rows and property
//!   slots.
//! - Provide the link-title candidate listing consumed by the resolver.
//!
//! # Invariants
//! - `article_entries.sort_order` rows are written densely from the
//!   aggregate's `OrderedReferenceMap`.
//! - `catalogues` memberships are a read model loaded from the catalogue
//!   side; saving an article never touches them.

use crate::model::article::{Article, ArticleId};
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for article aggregates.
pub trait ArticleRepository {
    /// Upserts one article with its ordered entries and properties.
    fn save(&self, article: &Article) -> RepoResult<()>;
    /// Loads one article by id.
    fn get(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Lists every `(title, article id)` pair known to storage.
    ///
    /// This is the candidate set source for implicit link resolution.
    fn list_link_titles(&self) -> RepoResult<Vec<(String, ArticleId)>>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn save(&self, article: &Article) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO articles (uuid, title)
             VALUES (?1, ?2)
             ON CONFLICT(uuid) DO UPDATE SET
                 title = excluded.title,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![article.uuid.to_string(), article.title.as_str()],
        )?;

        self.conn.execute(
            "DELETE FROM article_entries WHERE article_uuid = ?1;",
            [article.uuid.to_string()],
        )?;
        for (order, entry_uuid) in article.entries.in_order().into_iter().enumerate() {
            self.conn.execute(
                "INSERT INTO article_entries (article_uuid, entry_uuid, sort_order)
                 VALUES (?1, ?2, ?3);",
                params![
                    article.uuid.to_string(),
                    entry_uuid.to_string(),
                    order as i64
                ],
            )?;
        }

        self.conn.execute(
            "DELETE FROM article_properties WHERE article_uuid = ?1;",
            [article.uuid.to_string()],
        )?;
        for (name, entry_uuid) in &article.properties {
            self.conn.execute(
                "INSERT INTO article_properties (article_uuid, name, entry_uuid)
                 VALUES (?1, ?2, ?3);",
                params![
                    article.uuid.to_string(),
                    name.as_str(),
                    entry_uuid.to_string()
                ],
            )?;
        }

        Ok(())
    }

    fn get(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, title FROM articles WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut article = parse_article_row(row)?;

        let mut stmt = self.conn.prepare(
            "SELECT entry_uuid
             FROM article_entries
             WHERE article_uuid = ?1
             ORDER BY sort_order ASC, entry_uuid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let entry = parse_uuid(&value, "article_entries.entry_uuid")?;
            article.entries.append(entry).map_err(|err| {
                crate::repo::RepoError::InvalidData(format!(
                    "article_entries for {}: {err}",
                    article.uuid
                ))
            })?;
        }

        let mut stmt = self.conn.prepare(
            "SELECT name, entry_uuid
             FROM article_properties
             WHERE article_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let value: String = row.get(1)?;
            let entry = parse_uuid(&value, "article_properties.entry_uuid")?;
            article.properties.insert(name, entry);
        }

        let mut stmt = self.conn.prepare(
            "SELECT catalogue_uuid
             FROM catalogue_articles
             WHERE article_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let catalogue = parse_uuid(&value, "catalogue_articles.catalogue_uuid")?;
            article.catalogues.insert(catalogue);
        }

        Ok(Some(article))
    }

    fn list_link_titles(&self) -> RepoResult<Vec<(String, ArticleId)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, uuid FROM articles ORDER BY title ASC, uuid ASC;")?;
        let mut rows = stmt.query([])?;

        let mut titles = Vec::new();
        while let Some(row) = rows.next()? {
            let title: String = row.get(0)?;
            let uuid_text: String = row.get(1)?;
            titles.push((title, parse_uuid(&uuid_text, "articles.uuid")?));
        }
        Ok(titles)
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let uuid_text: String = row.get(0)?;
    let uuid = parse_uuid(&uuid_text, "articles.uuid")?;
    let title: String = row.get(1)?;
    Ok(Article::with_id(uuid, title))
}
