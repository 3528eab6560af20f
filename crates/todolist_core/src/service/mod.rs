//! Procedure layer: the request handlers a UI calls.
//!
//! # Responsibility
//! - Authenticate the caller, validate input shape, then delegate one unit
//!   of work to a repository.
//! - Collapse repository failures into the four procedure error kinds.

pub mod todo_service;
