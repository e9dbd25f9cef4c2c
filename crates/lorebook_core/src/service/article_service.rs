//! Article ordering use-case service.
//!
//! # Responsibility
//! - Apply ordered-reference semantics to an article's entry list.
//! - Manage named property slots pointing at entries.
//!
//! # Invariants
//! - Entry order values stay dense under append/remove/swap.
//! - Property names are unique; setting an existing name overwrites it.

use crate::model::article::{Article, ArticleId};
use crate::model::entry::{Entry, EntryId};
use crate::model::ordered_refs::OrderedRefError;
use crate::repo::article_repo::ArticleRepository;
use crate::repo::entry_repo::EntryRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from article ordering operations.
#[derive(Debug)]
pub enum ArticleServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target article does not exist.
    ArticleNotFound(ArticleId),
    /// Referenced entry does not exist in storage.
    EntryNotFound(EntryId),
    /// Entry is already part of the article's ordering.
    EntryAlreadyAttached { article: ArticleId, entry: EntryId },
    /// Entry is not part of the article's ordering.
    EntryNotAttached { article: ArticleId, entry: EntryId },
    /// Named property slot does not exist.
    PropertyNotFound { article: ArticleId, name: String },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ArticleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "article title must not be blank"),
            Self::ArticleNotFound(id) => write!(f, "article not found: {id}"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::EntryAlreadyAttached { article, entry } => {
                write!(f, "entry {entry} already attached to article {article}")
            }
            Self::EntryNotAttached { article, entry } => {
                write!(f, "entry {entry} not attached to article {article}")
            }
            Self::PropertyNotFound { article, name } => {
                write!(f, "article {article} has no property `{name}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArticleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ArticleNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Article ordering service facade.
pub struct ArticleService<A: ArticleRepository, E: EntryRepository> {
    articles: A,
    entries: E,
}

impl<A: ArticleRepository, E: EntryRepository> ArticleService<A, E> {
    /// Creates a service from repository implementations.
    pub fn new(articles: A, entries: E) -> Self {
        Self { articles, entries }
    }

    /// Creates and persists one article.
    pub fn create_article(
        &self,
        title: impl Into<String>,
    ) -> Result<Article, ArticleServiceError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ArticleServiceError::InvalidTitle);
        }

        let article = Article::new(trimmed);
        self.articles.save(&article)?;
        Ok(article)
    }

    /// Loads one article by id.
    pub fn get_article(&self, id: ArticleId) -> Result<Article, ArticleServiceError> {
        self.articles
            .get(id)?
            .ok_or(ArticleServiceError::ArticleNotFound(id))
    }

    /// Creates a new entry from content and appends it to the article.
    pub fn append_entry(
        &self,
        article_uuid: ArticleId,
        content: impl Into<String>,
    ) -> Result<Entry, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;

        let entry = Entry::new(content);
        self.entries.insert(&entry)?;
        article
            .entries
            .append(entry.uuid)
            .map_err(|_| ArticleServiceError::EntryAlreadyAttached {
                article: article_uuid,
                entry: entry.uuid,
            })?;
        self.articles.save(&article)?;
        Ok(entry)
    }

    /// Appends an existing entry to the article's ordering.
    pub fn attach_entry(
        &self,
        article_uuid: ArticleId,
        entry_uuid: EntryId,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;
        self.ensure_entry_exists(entry_uuid)?;

        article
            .entries
            .append(entry_uuid)
            .map_err(|_| ArticleServiceError::EntryAlreadyAttached {
                article: article_uuid,
                entry: entry_uuid,
            })?;
        self.articles.save(&article)?;
        Ok(article)
    }

    /// Removes an entry from the article's ordering and compacts it.
    ///
    /// The entry row itself is kept; only the attachment goes away.
    pub fn remove_entry(
        &self,
        article_uuid: ArticleId,
        entry_uuid: EntryId,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;
        article
            .entries
            .remove(entry_uuid)
            .map_err(|_| ArticleServiceError::EntryNotAttached {
                article: article_uuid,
                entry: entry_uuid,
            })?;
        self.articles.save(&article)?;
        Ok(article)
    }

    /// Exchanges the display order of two attached entries.
    pub fn swap_entries(
        &self,
        article_uuid: ArticleId,
        first: EntryId,
        second: EntryId,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;
        article
            .entries
            .swap(first, second)
            .map_err(|err| match err {
                OrderedRefError::ReferenceNotFound(missing) => {
                    ArticleServiceError::EntryNotAttached {
                        article: article_uuid,
                        entry: missing,
                    }
                }
                OrderedRefError::DuplicateReference(duplicate) => {
                    ArticleServiceError::EntryAlreadyAttached {
                        article: article_uuid,
                        entry: duplicate,
                    }
                }
            })?;
        self.articles.save(&article)?;
        Ok(article)
    }

    /// Points a named property slot at an entry, overwriting any previous
    /// target of that name.
    pub fn set_property(
        &self,
        article_uuid: ArticleId,
        name: impl Into<String>,
        entry_uuid: EntryId,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;
        self.ensure_entry_exists(entry_uuid)?;

        article.properties.insert(name.into(), entry_uuid);
        self.articles.save(&article)?;
        Ok(article)
    }

    /// Clears a named property slot.
    pub fn remove_property(
        &self,
        article_uuid: ArticleId,
        name: &str,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_article(article_uuid)?;
        if article.properties.remove(name).is_none() {
            return Err(ArticleServiceError::PropertyNotFound {
                article: article_uuid,
                name: name.to_string(),
            });
        }
        self.articles.save(&article)?;
        Ok(article)
    }

    fn ensure_entry_exists(&self, entry_uuid: EntryId) -> Result<(), ArticleServiceError> {
        if self.entries.get(entry_uuid)?.is_none() {
            return Err(ArticleServiceError::EntryNotFound(entry_uuid));
        }
        Ok(())
    }
}
