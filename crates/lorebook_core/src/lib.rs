//! Core domain logic for Lorebook.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleId};
pub use model::catalogue::{Catalogue, CatalogueId};
pub use model::entry::{Entry, EntryId};
pub use model::ordered_refs::{OrderedRefError, OrderedReferenceMap, ReferenceId};
pub use repo::article_repo::{ArticleRepository, SqliteArticleRepository};
pub use repo::catalogue_repo::{
    CatalogueRepository, CatalogueWriteBatch, SqliteCatalogueRepository,
};
pub use repo::entry_repo::{EntryRepository, SqliteEntryRepository};
pub use repo::synonym_repo::{SqliteSynonymTable, SynonymTable};
pub use repo::{RepoError, RepoResult};
pub use search::title_index::{search_titles, SearchError, SearchResult, TitleHit, TitleQuery};
pub use service::article_service::{ArticleService, ArticleServiceError};
pub use service::catalogue_service::{CatalogueService, CatalogueServiceError};
pub use service::link_service::{
    normalize_phrase, resolve_implicit_links, LinkService, LinkServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
