//! Pure hierarchy invariant predicates.
//!
//! # Responsibility
//! - Answer cycle/self-containment questions for reparent requests
//!   without touching storage.
//!
//! # Invariants
//! - The circular-inheritance guard inspects exactly one level up
//!   (`new_parent.parent_uuid == child`). Longer cycles pass the guard;
//!   this matches the observed product behavior and is documented as a
//!   known gap in the hierarchy tests.

use crate::model::catalogue::{Catalogue, CatalogueId};

/// Returns whether a reparent would make a catalogue its own parent.
pub fn is_self_containment(child: CatalogueId, new_parent: CatalogueId) -> bool {
    child == new_parent
}

/// Returns whether a reparent would close a direct two-node cycle.
pub fn is_circular_inheritance(child: CatalogueId, new_parent: &Catalogue) -> bool {
    new_parent.parent_uuid == Some(child)
}

/// Returns whether `child` already points at `new_parent`.
pub fn is_already_child(child: &Catalogue, new_parent: CatalogueId) -> bool {
    child.parent_uuid == Some(new_parent)
}
