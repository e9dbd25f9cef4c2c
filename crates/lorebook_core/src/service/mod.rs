//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep adapter/dispatch layers decoupled from storage details.
//!
//! # Invariants
//! - Services never call back into dispatch or adapter layers; they
//!   return updated aggregates for the caller to expose.

pub mod article_service;
pub mod catalogue_service;
pub mod link_service;
