//! Ownership predicate shared by every list/item-scoped query.
//!
//! An item's owner is the owner of the list it belongs to, so both
//! resource kinds resolve to a `todo_lists.user_id` comparison.

use crate::model::todo::{TodoItemId, TodoListId};
use crate::model::user::UserId;
use crate::repo::todo_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};
use std::fmt::{Display, Formatter};

/// A list or item addressed by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnedResource {
    List(TodoListId),
    Item(TodoItemId),
}

impl Display for OwnedResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(id) => write!(f, "list {id}"),
            Self::Item(id) => write!(f, "item {id}"),
        }
    }
}

/// Returns whether `resource` exists and resolves under `owner`.
pub fn resource_owned_by(
    conn: &Connection,
    owner: &UserId,
    resource: OwnedResource,
) -> RepoResult<bool> {
    let (sql, id) = match resource {
        OwnedResource::List(id) => (
            "SELECT EXISTS(
                SELECT 1
                FROM todo_lists
                WHERE id = ?1
                  AND user_id = ?2
            );",
            id,
        ),
        OwnedResource::Item(id) => (
            "SELECT EXISTS(
                SELECT 1
                FROM todo_items i
                INNER JOIN todo_lists l ON l.id = i.todo_list_id
                WHERE i.id = ?1
                  AND l.user_id = ?2
            );",
            id,
        ),
    };

    let exists: i64 = conn.query_row(sql, params![id.to_string(), owner.as_str()], |row| {
        row.get(0)
    })?;
    Ok(exists == 1)
}

/// Fails with `NotFound` unless `resource` resolves under `owner`.
pub fn ensure_owned_by(
    conn: &Connection,
    owner: &UserId,
    resource: OwnedResource,
) -> RepoResult<()> {
    if resource_owned_by(conn, owner, resource)? {
        Ok(())
    } else {
        Err(RepoError::NotFound(resource))
    }
}
