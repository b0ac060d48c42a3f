use domain::{Task, TaskStats, TaskStatus, Timestamp, User};
use shared::{ClientError, ErrorCategory};
use std::fmt::Write;

pub const EMPTY_LIST_MESSAGE: &str = "No tasks found. Create your first task to get started!";
pub const NOT_FOUND_MESSAGE: &str = "Task not found";

/// 期限日の表示（例: `Jun 1, 2024`）
/// 解釈できない値はサーバーの文字列をそのまま出す
pub fn due_label(due: Option<&Timestamp>) -> String {
    match due {
        Some(due) => due
            .parse()
            .map(|dt| dt.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|_| due.as_str().to_string()),
        None => "No due date".to_string(),
    }
}

fn id_label(task: &Task) -> String {
    task.id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "#?".to_string())
}

/// 一覧の 1 行
pub fn task_line(task: &Task) -> String {
    let mut line = format!("{} [{}] {}", id_label(task), task.status.label(), task.title);
    if task.due_date.is_some() {
        let _ = write!(line, " (due {})", due_label(task.due_date.as_ref()));
    }
    line
}

pub fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_LIST_MESSAGE.to_string();
    }
    tasks.iter().map(task_line).collect::<Vec<_>>().join("\n")
}

/// 詳細表示
pub fn task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", id_label(task), task.title);
    let _ = writeln!(out, "  Status:      {}", task.status.label());
    let _ = writeln!(out, "  Due:         {}", due_label(task.due_date.as_ref()));
    if !task.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", task.description);
    }
    if !task.remarks.is_empty() {
        let _ = writeln!(out, "  Remarks:     {}", task.remarks);
    }
    if let Some(created) = &task.created_on {
        let _ = writeln!(out, "  Created:     {created}");
    }
    if let Some(updated) = &task.last_updated_on {
        let _ = writeln!(out, "  Updated:     {updated}");
    }
    out.trim_end().to_string()
}

pub fn stats_table(stats: &TaskStats) -> String {
    let mut out = format!("{:<12} {}", "TOTAL", stats.total_tasks);
    for status in TaskStatus::ALL {
        let _ = write!(out, "\n{:<12} {}", status.label(), stats.count(status));
    }
    out
}

pub fn user_summary(user: &User) -> String {
    format!(
        "{} <{}> (id {}, member since {})",
        user.username,
        user.email,
        user.id,
        due_label(Some(&user.created_on))
    )
}

/// 失敗時のメッセージ
/// 見つからない場合は専用の表示、サーバーのメッセージがあればそれを優先する
pub fn failure(error: &ClientError, action: &str) -> String {
    match error.category() {
        ErrorCategory::NotFound => NOT_FOUND_MESSAGE.to_string(),
        ErrorCategory::Structured => error
            .api_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{action}. Please try again.")),
        ErrorCategory::Unstructured => format!("{action}. Please try again."),
    }
}
