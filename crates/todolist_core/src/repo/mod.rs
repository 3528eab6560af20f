//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from the procedure layer.
//! - Apply the ownership predicate inside every list/item-scoped unit of work.
//!
//! # Invariants
//! - Writes call `validate()` on the record before SQL mutations.
//! - A resource that is missing or owned by someone else is reported as
//!   `RepoError::NotFound`; the two cases are indistinguishable.

pub mod ownership;
pub mod todo_repo;
pub mod user_repo;
