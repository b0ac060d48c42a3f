use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use domain::{parse_datetime, DomainError, TaskId, TaskStatus, Timestamp};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tasks", version, about = "Command-line client for the Task Management API")]
pub struct Cli {
    /// API base URL (defaults to TASKS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session file path (defaults to TASKS_SESSION_FILE)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account (does not log in)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Fetch the profile from the server instead of the stored record
        #[arg(long)]
        remote: bool,
    },
    /// List tasks, optionally filtered by status or keyword
    List {
        /// Takes precedence over --search
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one task
    Show { id: TaskId },
    /// Create a task
    Create(CreateArgs),
    /// Edit a task
    Update(UpdateArgs),
    /// Delete a task
    Delete { id: TaskId },
    /// List tasks due within a date range (inclusive)
    Range {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Show task counts per status
    Stats,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Due date, e.g. 2024-06-01 or 2024-06-01T09:00
    #[arg(long, value_parser = parse_due)]
    pub due: Option<Timestamp>,
    #[arg(long, default_value_t = TaskStatus::Pending)]
    pub status: TaskStatus,
    #[arg(long, default_value = "")]
    pub remarks: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: TaskId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
    pub due: Option<Timestamp>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub remarks: Option<String>,
}

/// 期限日の入力を ISO 形式のタイムスタンプに変換
fn parse_due(input: &str) -> Result<Timestamp, DomainError> {
    parse_datetime(input).map(Timestamp::from_datetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_with_status() {
        let cli = Cli::try_parse_from(["tasks", "list", "--status", "in_progress"]).unwrap();
        match cli.command {
            Command::List { status, search } => {
                assert_eq!(status, Some(TaskStatus::InProgress));
                assert_eq!(search, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_defaults() {
        let cli = Cli::try_parse_from([
            "tasks", "create", "--title", "Buy milk", "--due", "2024-06-01",
        ])
        .unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.title, "Buy milk");
        assert_eq!(args.status, TaskStatus::Pending);
        assert_eq!(args.description, "");
        assert_eq!(
            args.due.as_ref().map(Timestamp::as_str),
            Some("2024-06-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_parse_update_rejects_conflicting_due_flags() {
        let result = Cli::try_parse_from([
            "tasks",
            "update",
            "3",
            "--due",
            "2024-06-01",
            "--clear-due",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tasks",
            "show",
            "12",
            "--json",
            "--api-url",
            "http://api.local",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://api.local"));
        assert!(matches!(cli.command, Command::Show { id } if id == TaskId(12)));
    }

    #[test]
    fn test_parse_invalid_inputs() {
        assert!(Cli::try_parse_from(["tasks", "show", "abc"]).is_err());
        assert!(Cli::try_parse_from(["tasks", "list", "--status", "DONE"]).is_err());
        assert!(Cli::try_parse_from(["tasks", "range", "--from", "2024-01-01"]).is_err());
    }
}
