//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todolist_core` linkage and that migrations apply cleanly.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use todolist_core::db::{migrations::latest_version, open_db_in_memory};

fn main() -> ExitCode {
    println!("todolist_core ping={}", todolist_core::ping());
    println!("todolist_core version={}", todolist_core::core_version());

    match open_db_in_memory() {
        Ok(_) => {
            println!("todolist_core schema_version={}", latest_version());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("todolist_core schema bootstrap failed: {err}");
            ExitCode::FAILURE
        }
    }
}
