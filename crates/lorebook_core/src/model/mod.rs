//! Domain model for the catalogue/article/entry aggregate family.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep ordering state (`OrderedReferenceMap`) owned by its aggregate.
//!
//! # Invariants
//! - Aggregates reference each other by stable `Uuid` only, never by
//!   embedded object graphs.
//! - Order values of every ordered collection stay dense (`0..n-1`).

pub mod article;
pub mod catalogue;
pub mod entry;
pub mod hierarchy;
pub mod ordered_refs;
