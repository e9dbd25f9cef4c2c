//! Article aggregate.
//!
//! # Responsibility
//! - Represent one article with its ordered entry list, named property
//!   slots and catalogue memberships.
//!
//! # Invariants
//! - Property names are unique; a slot holds exactly one entry reference.
//! - `catalogues` is derived from the catalogue side on load; article
//!   saves never mutate memberships.

use crate::model::entry::EntryId;
use crate::model::ordered_refs::OrderedReferenceMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Stable article identifier.
pub type ArticleId = Uuid;

/// One wiki article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Stable global ID used by links, listings and properties.
    pub uuid: ArticleId,
    /// Display title; also the source of this article's link title.
    pub title: String,
    /// Ordered entry references forming the article body.
    pub entries: OrderedReferenceMap,
    /// Named property slots (`property name -> entry reference`).
    pub properties: BTreeMap<String, EntryId>,
    /// Catalogue memberships, read model only.
    pub catalogues: BTreeSet<Uuid>,
}

impl Article {
    /// Creates an article with a generated stable ID.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates an article with a caller-provided stable ID.
    pub fn with_id(uuid: ArticleId, title: impl Into<String>) -> Self {
        Self {
            uuid,
            title: title.into(),
            entries: OrderedReferenceMap::new(),
            properties: BTreeMap::new(),
            catalogues: BTreeSet::new(),
        }
    }
}
