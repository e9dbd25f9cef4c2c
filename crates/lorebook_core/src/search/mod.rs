//! Article title lookup entry points.
//!
//! # Responsibility
//! - Expose exact/partial title queries backed by the SQLite FTS5 index.
//! - Keep result shaping inside core.

pub mod title_index;
