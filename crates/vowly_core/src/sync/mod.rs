//! Optimistic live-collection sync.
//!
//! # Responsibility
//! - Mirror one remote collection per entity kind into local state.
//! - Apply mutations optimistically and roll back on write failure.
//!
//! # Invariants
//! - A stream snapshot always replaces the mirror wholesale, never merged.
//! - A failed write restores the exact pre-mutation mirror state.
//! - No automatic retry anywhere in this module.

pub mod coordinator;
pub mod record;

pub use coordinator::{
    is_placeholder_id, LiveCollection, MutationError, MutationKind,
};
pub use record::CollectionRecord;
