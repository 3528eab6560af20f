//! Todo procedure service.
//!
//! # Responsibility
//! - Expose the eight todo procedures with typed inputs and results.
//! - Fail fast: no session and malformed input never reach the store.
//! - Emit one metadata-only log event per procedure call.
//!
//! # Invariants
//! - Check order is session, then input shape, then ownership.
//! - `NotFound` carries no detail, so "absent" and "not yours" look the same.
//! - Mutations return the authoritative stored state.

use crate::model::todo::{
    validate_item_name, validate_list_name, TodoItem, TodoItemId, TodoList, TodoListId,
    TodoListWithItems, TodoValidationError,
};
use crate::model::user::{Session, UserId};
use crate::repo::todo_repo::{ItemCompletion, RepoError, TodoRepository};
use log::{log, Level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ProcedureResult<T> = Result<T, ProcedureError>;

/// Failure kinds surfaced to procedure callers.
#[derive(Debug)]
pub enum ProcedureError {
    /// Malformed or empty input. Never retried.
    Validation(TodoValidationError),
    /// No signed-in caller.
    Unauthenticated,
    /// Target missing or owned by another user.
    NotFound,
    /// Persistence failure. The caller may retry the whole call.
    Store(RepoError),
}

impl ProcedureError {
    /// Stable wire code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Store(_) => "store_error",
        }
    }
}

impl Display for ProcedureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthenticated => write!(f, "sign-in required"),
            Self::NotFound => write!(f, "not found"),
            Self::Store(_) => write!(f, "store operation failed"),
        }
    }
}

impl Error for ProcedureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Unauthenticated | Self::NotFound => None,
        }
    }
}

impl From<TodoValidationError> for ProcedureError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProcedureError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(_) => Self::NotFound,
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Procedure facade over a todo repository.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns all of the caller's lists, each with only its open items.
    pub fn list_todo_lists(&self, session: &Session) -> ProcedureResult<Vec<TodoListWithItems>> {
        run_procedure("list_todo_lists", || {
            let owner = require_user(session)?;
            Ok(self.repo.list_lists_with_open_items(owner)?)
        })
    }

    /// Returns one owned list with every item, done or not.
    pub fn get_list(
        &self,
        session: &Session,
        list_id: TodoListId,
    ) -> ProcedureResult<TodoListWithItems> {
        run_procedure("get_list", || {
            let owner = require_user(session)?;
            Ok(self.repo.get_list_with_items(owner, list_id)?)
        })
    }

    /// Creates a list owned by the caller.
    pub fn add_list(&self, session: &Session, name: &str) -> ProcedureResult<TodoList> {
        run_procedure("add_list", || {
            let owner = require_user(session)?;
            validate_list_name(name)?;
            let list = TodoList::new(owner.clone(), name);
            self.repo.create_list(&list)?;
            Ok(list)
        })
    }

    /// Renames an owned list in place.
    pub fn rename_list(
        &self,
        session: &Session,
        list_id: TodoListId,
        name: &str,
    ) -> ProcedureResult<TodoList> {
        run_procedure("rename_list", || {
            let owner = require_user(session)?;
            validate_list_name(name)?;
            Ok(self.repo.rename_list(owner, list_id, name)?)
        })
    }

    /// Deletes an owned list and all of its items.
    ///
    /// Deleting an already-absent list is `NotFound`, not success.
    pub fn remove_list(&self, session: &Session, list_id: TodoListId) -> ProcedureResult<()> {
        run_procedure("remove_list", || {
            let owner = require_user(session)?;
            Ok(self.repo.delete_list(owner, list_id)?)
        })
    }

    /// Adds a not-done item to an owned list.
    pub fn add_item(
        &self,
        session: &Session,
        name: &str,
        list_id: TodoListId,
    ) -> ProcedureResult<TodoItem> {
        run_procedure("add_item", || {
            let owner = require_user(session)?;
            validate_item_name(name)?;
            let item = TodoItem::new(list_id, name);
            self.repo.create_item(owner, &item)?;
            Ok(item)
        })
    }

    /// Sets an owned item's done flag. Repeating the same value succeeds.
    ///
    /// Returns the stored item and its refreshed parent list.
    pub fn set_item_completion(
        &self,
        session: &Session,
        item_id: TodoItemId,
        done: bool,
    ) -> ProcedureResult<ItemCompletion> {
        run_procedure("set_item_completion", || {
            let owner = require_user(session)?;
            Ok(self.repo.set_item_done(owner, item_id, done)?)
        })
    }

    /// Deletes an owned item.
    pub fn remove_item(&self, session: &Session, item_id: TodoItemId) -> ProcedureResult<()> {
        run_procedure("remove_item", || {
            let owner = require_user(session)?;
            Ok(self.repo.delete_item(owner, item_id)?)
        })
    }
}

fn require_user(session: &Session) -> ProcedureResult<&UserId> {
    session.user_id().ok_or(ProcedureError::Unauthenticated)
}

fn run_procedure<T>(
    name: &'static str,
    body: impl FnOnce() -> ProcedureResult<T>,
) -> ProcedureResult<T> {
    let started_at = Instant::now();
    let result = body();
    let duration_ms = started_at.elapsed().as_millis();

    let (level, event) = procedure_event(name, duration_ms, result.as_ref().err());
    log!(level, "{event}");

    result
}

/// Formats the metadata-only event for one finished procedure call.
fn procedure_event(
    name: &str,
    duration_ms: u128,
    failure: Option<&ProcedureError>,
) -> (Level, String) {
    let (level, status, detail) = match failure {
        None => (Level::Debug, "ok", String::new()),
        Some(ProcedureError::Store(err)) => (
            Level::Error,
            "error",
            format!(" error_code=store_error error={err}"),
        ),
        Some(err) => (Level::Warn, "error", format!(" error_code={}", err.code())),
    };
    (
        level,
        format!(
            "event=procedure module=service status={status} procedure={name} duration_ms={duration_ms}{detail}"
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::{procedure_event, ProcedureError};
    use crate::db::DbError;
    use crate::model::todo::TodoValidationError;
    use crate::repo::ownership::OwnedResource;
    use crate::repo::todo_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_not_found_drops_resource_detail() {
        let err: ProcedureError = RepoError::NotFound(OwnedResource::List(Uuid::new_v4())).into();
        assert!(matches!(err, ProcedureError::NotFound));
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn repo_validation_stays_validation() {
        let err: ProcedureError = RepoError::Validation(TodoValidationError::BlankItemName).into();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn store_failures_are_opaque() {
        let err: ProcedureError =
            RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)).into();
        assert_eq!(err.code(), "store_error");
        assert_eq!(err.to_string(), "store operation failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn procedure_events_use_ok_or_error_status() {
        let (level, event) = procedure_event("add_list", 3, None);
        assert_eq!(level, log::Level::Debug);
        assert!(event.contains("status=ok"));

        let not_found = ProcedureError::NotFound;
        let (level, event) = procedure_event("get_list", 1, Some(&not_found));
        assert_eq!(level, log::Level::Warn);
        assert!(event.contains("status=error"));
        assert!(event.contains("error_code=not_found"));

        let store: ProcedureError =
            RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)).into();
        let (level, event) = procedure_event("remove_list", 2, Some(&store));
        assert_eq!(level, log::Level::Error);
        assert!(event.contains("status=error"));
        assert!(event.contains("error_code=store_error"));

        for failure in [&not_found, &ProcedureError::Unauthenticated] {
            let (_, event) = procedure_event("add_item", 0, Some(failure));
            assert!(!event.contains("rejected"));
        }
    }
}
