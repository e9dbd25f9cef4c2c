//! Entry aggregate.
//!
//! # Responsibility
//! - Represent one paragraph of article content together with its
//!   explicit and machine-derived links.
//!
//! # Invariants
//! - `explicit_links` is author-authored and authoritative; the link
//!   resolver never writes it.
//! - `implicit_links` is replaced wholesale on every re-link run.
//! - `content` is stored verbatim; normalization is a matching aid only.

use crate::model::article::ArticleId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable entry identifier.
pub type EntryId = Uuid;

/// One free-text entry of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable global ID.
    pub uuid: EntryId,
    /// Raw free-text content.
    pub content: String,
    /// Author-declared `literal substring -> target article` links.
    pub explicit_links: BTreeMap<String, ArticleId>,
    /// Machine-derived `matched phrase -> target article` links.
    pub implicit_links: BTreeMap<String, ArticleId>,
}

impl Entry {
    /// Creates an entry with a generated stable ID and no links.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), content)
    }

    /// Creates an entry with a caller-provided stable ID.
    pub fn with_id(uuid: EntryId, content: impl Into<String>) -> Self {
        Self {
            uuid,
            content: content.into(),
            explicit_links: BTreeMap::new(),
            implicit_links: BTreeMap::new(),
        }
    }

    /// Returns a copy with `implicit_links` replaced wholesale.
    pub fn relinked(mut self, implicit_links: BTreeMap<String, ArticleId>) -> Self {
        self.implicit_links = implicit_links;
        self
    }
}
