//! Core domain logic for the multi-user todo-list manager.
//! This crate is the single source of truth for ownership and validation rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::todo::{
    parse_item_id, parse_list_id, validate_item_name, validate_list_name, TodoItem, TodoItemId,
    TodoList, TodoListId, TodoListWithItems, TodoValidationError,
};
pub use model::user::{Session, UserId};
pub use repo::ownership::{resource_owned_by, OwnedResource};
pub use repo::todo_repo::{
    ItemCompletion, RepoError, RepoResult, SqliteTodoRepository, TodoRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::todo_service::{ProcedureError, ProcedureResult, TodoService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
