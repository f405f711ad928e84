//! Use-case services consumed by the UI and FFI layers.
//!
//! # Responsibility
//! - Orchestrate live collections into screen-level APIs.
//! - Keep UI/FFI layers decoupled from store and sync details.
//!
//! # Invariants
//! - Every mutation validates its record before touching local or remote
//!   state.

pub mod budget_service;
pub mod note_service;
pub mod task_service;
