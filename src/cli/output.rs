//! Output formatting for the CLI.

use crate::core::{Todo, User};
use crate::error::Result;
use serde::Serialize;

/// Pretty JSON for `--json`.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn format_owner(todo: &Todo) -> String {
    match todo.user_id {
        Some(id) => format!("user #{id}"),
        None => "-".to_string(),
    }
}

/// One line per todo.
pub fn format_todo_line(todo: &Todo) -> String {
    format!("  [{}] {} {}", todo.id, todo.status_char(), todo.title)
}

/// Format the list output.
pub fn format_list(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No todos");
        return;
    }

    for todo in todos {
        println!("{}", format_todo_line(todo));
    }

    println!();
    println!("Legend: ✓ completed  ○ pending");
}

/// Format a single todo in detail.
pub fn format_show(todo: &Todo) {
    println!("[#{}] {}", todo.id, todo.title);
    println!(
        "Status:       {}",
        if todo.completed { "completed" } else { "pending" }
    );
    println!("Owner:        {}", format_owner(todo));
    println!("Created:      {}", todo.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated:      {}", todo.updated_at.format("%Y-%m-%d %H:%M"));
    if !todo.description.is_empty() {
        println!();
        println!("{}", todo.description);
    }
}

/// Format a single user.
pub fn format_user(user: &User) {
    println!("[#{}] {}", user.id, user.username);
    println!("Email:        {}", user.email);
    println!("Created:      {}", user.created_at.format("%Y-%m-%d %H:%M"));
}
