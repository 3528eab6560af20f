//! FFI procedure API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the todo procedures to Dart via FRB with plain string ids.
//! - Translate procedure failures into stable `error_code` values.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Session is checked before ids are parsed; both before the DB is opened.
//! - Responses never echo the caller's user id.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use todolist_core::db::open_db;
use todolist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, parse_item_id,
    parse_list_id, ping as ping_inner, ItemCompletion, ProcedureError, ProcedureResult, RepoError,
    Session, SqliteTodoRepository, SqliteUserRepository, TodoItem, TodoList, TodoListWithItems,
    TodoService, UserId, UserRepository,
};

const DB_FILE_NAME: &str = "todolist.sqlite3";
const DB_PATH_ENV: &str = "TODOLIST_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One todo item as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemView {
    pub id: String,
    pub name: String,
    pub done: bool,
    pub list_id: String,
}

impl From<TodoItem> for TodoItemView {
    fn from(item: TodoItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name,
            done: item.done,
            list_id: item.todo_list_id.to_string(),
        }
    }
}

/// One todo list with whichever items the procedure returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListView {
    pub id: String,
    pub name: String,
    pub items: Vec<TodoItemView>,
}

impl From<TodoList> for TodoListView {
    fn from(list: TodoList) -> Self {
        Self {
            id: list.id.to_string(),
            name: list.name,
            items: Vec::new(),
        }
    }
}

impl From<TodoListWithItems> for TodoListView {
    fn from(view: TodoListWithItems) -> Self {
        Self {
            items: view.items.into_iter().map(TodoItemView::from).collect(),
            ..Self::from(view.list)
        }
    }
}

/// Envelope for `todo_lists_get_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListsResponse {
    pub ok: bool,
    pub lists: Vec<TodoListView>,
    /// `validation_error|unauthenticated|not_found|store_error` on failure.
    pub error_code: Option<String>,
    pub message: String,
}

/// Envelope for single-list procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub list: Option<TodoListView>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Envelope for item procedures.
///
/// `list` is set by completion toggles so the UI can render the refreshed
/// parent list without another round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemResponse {
    pub ok: bool,
    pub item: Option<TodoItemView>,
    pub list: Option<TodoListView>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Envelope for procedures with no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
}

impl TodoListsResponse {
    fn from_result(result: ProcedureResult<Vec<TodoListWithItems>>) -> Self {
        match result {
            Ok(lists) => Self {
                message: format!("Found {} list(s).", lists.len()),
                ok: true,
                lists: lists.into_iter().map(TodoListView::from).collect(),
                error_code: None,
            },
            Err(err) => Self {
                ok: false,
                lists: Vec::new(),
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

impl TodoListResponse {
    fn from_result(result: ProcedureResult<TodoListView>, message: &str) -> Self {
        match result {
            Ok(list) => Self {
                ok: true,
                list: Some(list),
                error_code: None,
                message: message.to_string(),
            },
            Err(err) => Self {
                ok: false,
                list: None,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

impl TodoItemResponse {
    fn from_result(
        result: ProcedureResult<(TodoItemView, Option<TodoListView>)>,
        message: &str,
    ) -> Self {
        match result {
            Ok((item, list)) => Self {
                ok: true,
                item: Some(item),
                list,
                error_code: None,
                message: message.to_string(),
            },
            Err(err) => Self {
                ok: false,
                item: None,
                list: None,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

impl TodoActionResponse {
    fn from_result(result: ProcedureResult<()>, message: &str) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                error_code: None,
                message: message.to_string(),
            },
            Err(err) => Self {
                ok: false,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

/// Records a signed-in user. Called by the identity integration on first
/// sign-in; repeated calls succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn register_session_user(user_id: String) -> TodoActionResponse {
    let result = UserId::parse(user_id)
        .map_err(ProcedureError::from)
        .and_then(|user_id| {
            let conn = open_store()?;
            SqliteUserRepository::new(&conn)
                .ensure_user(&user_id)
                .map_err(ProcedureError::from)
        });
    TodoActionResponse::from_result(result, "User registered.")
}

/// Lists the caller's lists, each with its not-done items only.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_lists_get_all(session_user_id: Option<String>) -> TodoListsResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        with_todo_service(|service| service.list_todo_lists(session))
    });
    TodoListsResponse::from_result(result)
}

/// Gets one list with all of its items.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list_get(session_user_id: Option<String>, list_id: String) -> TodoListResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let list_id = parse_list_id(&list_id)?;
        with_todo_service(|service| service.get_list(session, list_id))
    });
    TodoListResponse::from_result(result.map(TodoListView::from), "List loaded.")
}

/// Creates a list owned by the caller.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list_add(session_user_id: Option<String>, name: String) -> TodoListResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        with_todo_service(|service| service.add_list(session, &name))
    });
    TodoListResponse::from_result(result.map(TodoListView::from), "List created.")
}

/// Renames one of the caller's lists.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list_rename(
    session_user_id: Option<String>,
    list_id: String,
    name: String,
) -> TodoListResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let list_id = parse_list_id(&list_id)?;
        with_todo_service(|service| service.rename_list(session, list_id, &name))
    });
    TodoListResponse::from_result(result.map(TodoListView::from), "List renamed.")
}

/// Deletes one of the caller's lists with all of its items.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list_remove(session_user_id: Option<String>, list_id: String) -> TodoActionResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let list_id = parse_list_id(&list_id)?;
        with_todo_service(|service| service.remove_list(session, list_id))
    });
    TodoActionResponse::from_result(result, "List removed.")
}

/// Adds a not-done item to one of the caller's lists.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_item_add(
    session_user_id: Option<String>,
    name: String,
    list_id: String,
) -> TodoItemResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let list_id = parse_list_id(&list_id)?;
        with_todo_service(|service| service.add_item(session, &name, list_id))
    });
    TodoItemResponse::from_result(
        result.map(|item| (TodoItemView::from(item), None)),
        "Item added.",
    )
}

/// Marks an item done or not done. Repeating the current value succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_item_set_completion(
    session_user_id: Option<String>,
    item_id: String,
    done: bool,
) -> TodoItemResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let item_id = parse_item_id(&item_id)?;
        with_todo_service(|service| service.set_item_completion(session, item_id, done))
    });
    TodoItemResponse::from_result(
        result.map(|ItemCompletion { item, list }| {
            (TodoItemView::from(item), Some(TodoListView::from(list)))
        }),
        "Item updated.",
    )
}

/// Deletes one of the caller's items.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_item_remove(session_user_id: Option<String>, item_id: String) -> TodoActionResponse {
    let result = procedure(session_user_id.as_deref(), |session| {
        let item_id = parse_item_id(&item_id)?;
        with_todo_service(|service| service.remove_item(session, item_id))
    });
    TodoActionResponse::from_result(result, "Item removed.")
}

fn procedure<T>(
    session_user_id: Option<&str>,
    body: impl FnOnce(&Session) -> ProcedureResult<T>,
) -> ProcedureResult<T> {
    let session = Session::from_raw(session_user_id);
    if !session.is_authenticated() {
        warn!("event=procedure module=ffi status=error error_code=unauthenticated");
        return Err(ProcedureError::Unauthenticated);
    }
    body(&session)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| db_path_from_env(std::env::var(DB_PATH_ENV).ok()))
        .clone()
}

/// Maps the raw `TODOLIST_DB_PATH` value to a store path.
///
/// Unset or blank values fall back to `todolist.sqlite3` in the temp dir.
fn db_path_from_env(raw: Option<String>) -> PathBuf {
    match raw.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(DB_FILE_NAME),
    }
}

fn open_store() -> ProcedureResult<rusqlite::Connection> {
    open_db(resolve_db_path()).map_err(|err| ProcedureError::Store(RepoError::Db(err)))
}

fn with_todo_service<T>(
    f: impl FnOnce(&TodoService<SqliteTodoRepository<'_>>) -> ProcedureResult<T>,
) -> ProcedureResult<T> {
    let conn = open_store()?;
    let repo = SqliteTodoRepository::try_new(&conn)?;
    let service = TodoService::new(repo);
    f(&service)
}
