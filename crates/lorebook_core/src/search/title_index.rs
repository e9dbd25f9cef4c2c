//! SQLite FTS5-based article title lookup.
//!
//! # Responsibility
//! - Answer exact/partial title queries for the article lookup
//!   capability consumed by outer layers.
//! - Return typed hits with stable IDs.
//!
//! # Invariants
//! - Blank queries return empty results instead of matching everything.
//! - Result ordering is deterministic by rank, then title, then id.

use crate::db::DbError;
use crate::model::article::ArticleId;
use crate::repo::parse_uuid;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for title lookup APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery { query: String, message: String },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid title query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid title hit: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<crate::repo::RepoError> for SearchError {
    fn from(value: crate::repo::RepoError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Options for title lookup behavior.
#[derive(Debug, Clone)]
pub struct TitleQuery {
    /// User query text.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Whether to match each term as a prefix (partial-title search).
    pub prefix: bool,
    /// Whether to pass text directly as a raw FTS5 expression.
    pub raw_fts_syntax: bool,
}

impl TitleQuery {
    /// Creates a prefix-matching query with default pagination.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 20,
            prefix: true,
            raw_fts_syntax: false,
        }
    }
}

/// Single hit returned by [`search_titles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleHit {
    pub article_id: ArticleId,
    pub title: String,
}

/// Searches article titles via FTS5 and returns ranked results.
///
/// Returns an empty list for blank queries.
pub fn search_titles(conn: &Connection, query: &TitleQuery) -> SearchResult<Vec<TitleHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let sql = "SELECT
            articles.uuid AS uuid,
            articles.title AS title
         FROM articles_fts
         JOIN articles ON articles.rowid = articles_fts.rowid
         WHERE articles_fts MATCH ?
         ORDER BY bm25(articles_fts), articles.title ASC, articles.uuid ASC
         LIMIT ?";
    let bind_values: Vec<Value> = vec![
        Value::Text(match_expr.clone()),
        Value::Integer(i64::from(query.limit)),
    ];

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;

    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_title_hit(row)?);
    }

    Ok(hits)
}

fn parse_title_hit(row: &Row<'_>) -> SearchResult<TitleHit> {
    let uuid_text: String = row.get("uuid")?;
    let article_id = parse_uuid(&uuid_text, "articles.uuid")?;

    Ok(TitleHit {
        article_id,
        title: row.get("title")?,
    })
}

fn build_match_expression(query: &TitleQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }

    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text
        .split_whitespace()
        .map(|term| escape_fts_term(term, query.prefix))
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str, prefix: bool) -> String {
    let escaped = raw.replace('"', "\"\"");
    if prefix {
        format!("\"{escaped}\" *")
    } else {
        format!("\"{escaped}\"")
    }
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
