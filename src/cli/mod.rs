//! CLI interface for the todo store.

pub mod output;

use crate::api;
use crate::core::{Scope, TodoUpdate};
use crate::db::DbPath;
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// todo - SQLite-backed todo list with per-user ownership
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(about = "A SQLite-backed todo list with per-user ownership", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to $TODO_DB, then ./todo.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database or migrate it to the current schema
    Init,

    /// Add a new todo
    Add {
        /// Todo title
        title: String,
        /// Todo description
        #[arg(short, long, default_value = "")]
        desc: String,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Show a todo
    Show {
        /// Todo ID
        id: i64,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Edit a todo
    Edit {
        /// Todo ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        desc: Option<String>,
        /// Mark as completed
        #[arg(long, conflicts_with = "undone")]
        done: bool,
        /// Mark as not completed
        #[arg(long)]
        undone: bool,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Remove a todo
    Rm {
        /// Todo ID
        id: i64,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// List todos
    List {
        /// Only completed todos
        #[arg(long, conflicts_with = "pending")]
        done: bool,
        /// Only todos not yet completed
        #[arg(long)]
        pending: bool,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user
    Add {
        /// Unique username
        username: String,
        /// Unique email address
        email: String,
    },

    /// Show a user
    Show {
        /// Username
        username: String,
    },

    /// Remove a user who owns no todos
    Rm {
        /// Username
        username: String,
    },
}

/// `--user` flag shared by the todo commands.
#[derive(Args, Debug, Default)]
pub struct OwnerArg {
    /// Act as this user: only their todos are visible
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Map `--user NAME` to a scope. An unknown name is an error.
fn resolve_scope(db: &DbPath, owner: &OwnerArg) -> anyhow::Result<Scope> {
    let Some(name) = owner.user.as_deref() else {
        return Ok(Scope::All);
    };
    match api::get_user_by_username(db, name)? {
        Some(user) => Ok(Scope::Owner(user.id)),
        None => bail!("User '{name}' not found"),
    }
}

fn completed_filter(done: bool, pending: bool) -> Option<bool> {
    match (done, pending) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let db = DbPath::resolve(cli.db.as_deref());
    tracing::debug!(path = %db.as_path().display(), "Using database");

    match cli.command {
        Command::Init => {
            api::init_schema(&db).with_context(|| {
                format!("Failed to initialize {}", db.as_path().display())
            })?;
            println!("Initialized todo database at {}", db.as_path().display());
        }

        Command::Add { title, desc, owner } => {
            let id = match resolve_scope(&db, &owner)? {
                Scope::All => api::create_todo(&db, &title, &desc)?,
                Scope::Owner(user_id) => api::create_user_todo(&db, user_id, &title, &desc)?,
            };
            println!("{id}");
        }

        Command::Show { id, owner } => {
            let todo = match resolve_scope(&db, &owner)? {
                Scope::All => api::get_todo(&db, id)?,
                Scope::Owner(user_id) => api::get_user_todo(&db, user_id, id)?,
            };
            let Some(todo) = todo else {
                bail!("Todo #{id} not found");
            };
            if cli.json {
                println!("{}", output::to_json(&todo)?);
            } else {
                output::format_show(&todo);
            }
        }

        Command::Edit {
            id,
            title,
            desc,
            done,
            undone,
            owner,
        } => {
            let changes = TodoUpdate {
                title,
                description: desc,
                completed: completed_filter(done, undone),
            };
            if changes.is_empty() {
                bail!("Nothing to change. Pass --title, --desc, --done or --undone");
            }
            let updated = match resolve_scope(&db, &owner)? {
                Scope::All => api::update_todo(&db, id, &changes)?,
                Scope::Owner(user_id) => api::update_user_todo(&db, user_id, id, &changes)?,
            };
            if !updated {
                bail!("Todo #{id} not found");
            }
            println!("Todo #{id} updated");
        }

        Command::Rm { id, owner } => {
            let deleted = match resolve_scope(&db, &owner)? {
                Scope::All => api::delete_todo(&db, id)?,
                Scope::Owner(user_id) => api::delete_user_todo(&db, user_id, id)?,
            };
            if !deleted {
                bail!("Todo #{id} not found");
            }
            println!("Todo #{id} removed");
        }

        Command::List {
            done,
            pending,
            owner,
        } => {
            let filter = completed_filter(done, pending);
            let todos = match resolve_scope(&db, &owner)? {
                Scope::All => api::list_todos(&db, filter)?,
                Scope::Owner(user_id) => api::list_user_todos(&db, user_id, filter)?,
            };
            if cli.json {
                println!("{}", output::to_json(&todos)?);
            } else {
                output::format_list(&todos);
            }
        }

        Command::User(UserCommand::Add { username, email }) => {
            let id = api::create_user(&db, &username, &email)?;
            println!("{id}");
        }

        Command::User(UserCommand::Show { username }) => {
            let Some(user) = api::get_user_by_username(&db, &username)? else {
                bail!("User '{username}' not found");
            };
            if cli.json {
                println!("{}", output::to_json(&user)?);
            } else {
                output::format_user(&user);
            }
        }

        Command::User(UserCommand::Rm { username }) => {
            let Some(user) = api::get_user_by_username(&db, &username)? else {
                bail!("User '{username}' not found");
            };
            if !api::delete_user(&db, user.id)? {
                bail!("User '{username}' not found");
            }
            println!("User '{username}' removed");
        }
    }

    Ok(())
}
