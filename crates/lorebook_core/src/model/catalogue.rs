//! Catalogue aggregate.
//!
//! # Responsibility
//! - Represent one node of the catalogue forest with ordered children
//!   and ordered article listings.
//!
//! # Invariants
//! - `title` is globally unique (enforced by service + storage).
//! - `children` must stay consistent with the `parent_uuid` pointers of
//!   the catalogues it names; both sides are written in one batch.

use crate::model::ordered_refs::OrderedReferenceMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable catalogue identifier.
pub type CatalogueId = Uuid;

/// One node of the catalogue hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    /// Stable global ID.
    pub uuid: CatalogueId,
    /// Globally unique display title.
    pub title: String,
    /// Parent catalogue. `None` means this catalogue is a root.
    pub parent_uuid: Option<CatalogueId>,
    /// Ordered child catalogue references.
    pub children: OrderedReferenceMap,
    /// Ordered article references listed under this catalogue.
    pub articles: OrderedReferenceMap,
}

impl Catalogue {
    /// Creates a root-level catalogue with a generated stable ID.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a catalogue with a caller-provided stable ID.
    ///
    /// Used by storage load paths where identity already exists.
    pub fn with_id(uuid: CatalogueId, title: impl Into<String>) -> Self {
        Self {
            uuid,
            title: title.into(),
            parent_uuid: None,
            children: OrderedReferenceMap::new(),
            articles: OrderedReferenceMap::new(),
        }
    }

    /// Returns whether this catalogue has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_uuid.is_none()
    }
}
