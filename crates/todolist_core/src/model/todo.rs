//! Todo list and todo item domain model.
//!
//! # Responsibility
//! - Define list/item records and the list-with-items read model.
//! - Validate names and wire ids before any store access.
//!
//! # Invariants
//! - Names are stored exactly as given and are never blank.
//! - `done` defaults to `false` for new items.
//! - Ids are UUID v4 and never reused.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a todo list.
pub type TodoListId = Uuid;

/// Stable identifier of a todo item.
pub type TodoItemId = Uuid;

/// Input-shape errors. Always raised before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// List name is empty after trimming.
    BlankListName,
    /// Item name is empty after trimming.
    BlankItemName,
    /// User id supplied by the session is empty after trimming.
    BlankUserId,
    /// Identifier does not parse as the store id type.
    MalformedId { field: &'static str, value: String },
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankListName => write!(f, "list name must not be blank"),
            Self::BlankItemName => write!(f, "item name must not be blank"),
            Self::BlankUserId => write!(f, "user id must not be blank"),
            Self::MalformedId { field, value } => {
                write!(f, "`{field}` is not a valid id: `{value}`")
            }
        }
    }
}

impl Error for TodoValidationError {}

/// A named list owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: TodoListId,
    pub name: String,
    pub user_id: UserId,
}

impl TodoList {
    /// Creates a new list with a generated id.
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_id,
        }
    }

    /// Checks persisted/persistable shape.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        validate_list_name(&self.name)
    }
}

/// A single todo entry inside one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoItemId,
    pub name: String,
    pub done: bool,
    pub todo_list_id: TodoListId,
}

impl TodoItem {
    /// Creates a new, not-done item under `todo_list_id`.
    pub fn new(todo_list_id: TodoListId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            done: false,
            todo_list_id,
        }
    }

    pub fn validate(&self) -> Result<(), TodoValidationError> {
        validate_item_name(&self.name)
    }
}

/// List read model with its eager-loaded items.
///
/// Whether `items` holds every item or only open ones depends on the
/// procedure that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListWithItems {
    #[serde(flatten)]
    pub list: TodoList,
    pub items: Vec<TodoItem>,
}

impl TodoListWithItems {
    /// Items not yet marked done, in stored order.
    pub fn open_items(&self) -> impl Iterator<Item = &TodoItem> {
        self.items.iter().filter(|item| !item.done)
    }
}

/// Rejects list names that are empty after trimming.
///
/// Only the check trims; the name itself is stored unchanged.
pub fn validate_list_name(name: &str) -> Result<(), TodoValidationError> {
    if name.trim().is_empty() {
        return Err(TodoValidationError::BlankListName);
    }
    Ok(())
}

/// Rejects item names that are empty after trimming.
pub fn validate_item_name(name: &str) -> Result<(), TodoValidationError> {
    if name.trim().is_empty() {
        return Err(TodoValidationError::BlankItemName);
    }
    Ok(())
}

/// Parses a wire list id.
pub fn parse_list_id(value: &str) -> Result<TodoListId, TodoValidationError> {
    parse_id("list_id", value)
}

/// Parses a wire item id.
pub fn parse_item_id(value: &str) -> Result<TodoItemId, TodoValidationError> {
    parse_id("item_id", value)
}

fn parse_id(field: &'static str, value: &str) -> Result<Uuid, TodoValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| TodoValidationError::MalformedId {
        field,
        value: value.to_string(),
    })
}
