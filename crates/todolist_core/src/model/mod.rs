//! Domain model for users, todo lists and todo items.
//!
//! # Responsibility
//! - Define canonical data structures used by the procedure layer.
//! - Own input-shape validation (blank names, malformed ids).
//!
//! # Invariants
//! - Every list has exactly one owning user.
//! - Every item belongs to exactly one list and inherits its owner.
//! - Deletion is hard delete; items never outlive their list.

pub mod todo;
pub mod user;
