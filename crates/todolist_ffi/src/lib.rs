//! Flutter-facing bindings for the todo procedure layer.

pub mod api;
