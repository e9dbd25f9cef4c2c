//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lorebook_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("lorebook_core ping={}", lorebook_core::ping());
    println!("lorebook_core version={}", lorebook_core::core_version());
}
