//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `vowly_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("vowly_core ping={}", vowly_core::ping());
    println!("vowly_core version={}", vowly_core::core_version());
}
