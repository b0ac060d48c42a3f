use crate::cli::{Cli, Command, CreateArgs, UpdateArgs};
use crate::render;
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use domain::{NewTask, Task, TaskId, TaskStatus};
use infrastructure::{ApiClient, FileStore, HttpAuthApi, SessionManager, TaskClient};
use serde::Serialize;
use shared::telemetry::record_error;
use shared::{ClientError, Config, Credentials};
use std::sync::Arc;
use tracing::{debug, info};

/// 結果の出力先（テキストか JSON）
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }

    fn message(&self, message: &str) -> Result<()> {
        self.emit(&serde_json::json!({ "message": message }), |_| message.to_string())
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let api = ApiClient::new(&config)?;
    let store = Arc::new(FileStore::new(config.session_file.clone()));
    let auth = Arc::new(HttpAuthApi::new(api.clone()));

    let mut session = SessionManager::new(auth, store);
    let restored = session.restore()?;
    debug!(
        restored = restored,
        session_file = %config.session_file.display(),
        "session restored"
    );

    let out = Output { json: cli.json };
    let tasks = TaskClient::new(api);

    match cli.command {
        Command::Login { username, password } => {
            login(&mut session, &out, &username, &password).await
        }
        Command::Register {
            username,
            email,
            password,
        } => register(&mut session, &out, &username, &email, &password).await,
        Command::Logout => {
            session.logout()?;
            out.message("Logged out")
        }
        Command::Whoami { remote } => whoami(&session, &out, remote).await,
        Command::List { status, search } => {
            let credentials = require_login(&session)?;
            list(&tasks, &out, &credentials, status, search.as_deref()).await
        }
        Command::Show { id } => {
            let credentials = require_login(&session)?;
            let task = tasks
                .get(&credentials, id)
                .await
                .map_err(|e| fail(e, "Failed to load task"))?;
            out.emit(&task, render::task_detail)
        }
        Command::Create(args) => {
            let credentials = require_login(&session)?;
            create(&tasks, &out, &credentials, args).await
        }
        Command::Update(args) => {
            let credentials = require_login(&session)?;
            update(&tasks, &out, &credentials, args).await
        }
        Command::Delete { id } => {
            let credentials = require_login(&session)?;
            delete(&tasks, &out, &credentials, id).await
        }
        Command::Range { from, to } => {
            let credentials = require_login(&session)?;
            range(&tasks, &out, &credentials, from, to).await
        }
        Command::Stats => {
            let credentials = require_login(&session)?;
            let stats = tasks
                .stats(&credentials)
                .await
                .map_err(|e| fail(e, "Failed to load statistics"))?;
            out.emit(&stats, render::stats_table)
        }
    }
}

/// タスク系コマンドは認証済みセッションが必要
fn require_login(session: &SessionManager) -> Result<Credentials> {
    session
        .credentials()
        .cloned()
        .ok_or_else(|| anyhow!("not logged in; run `tasks login` first"))
}

/// 失敗をログに残し、表示用のメッセージに変換
fn fail(error: ClientError, action: &str) -> anyhow::Error {
    record_error(&error, action);
    anyhow!(render::failure(&error, action))
}

async fn login(
    session: &mut SessionManager,
    out: &Output,
    username: &str,
    password: &str,
) -> Result<()> {
    if !session.login(username, password).await {
        bail!("{}", session.error().unwrap_or("Login failed"));
    }

    match session.user() {
        Some(user) => out.emit(user, |user| format!("Logged in as {}", user.username)),
        None => bail!("Login failed"),
    }
}

async fn register(
    session: &mut SessionManager,
    out: &Output,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    match session.register(username, email, password).await {
        Ok(registration) => out.emit(&registration, |r| {
            format!(
                "{} Run `tasks login -u {}` to sign in.",
                r.message.as_deref().unwrap_or("Registration successful."),
                r.username.as_deref().unwrap_or(username)
            )
        }),
        Err(_) => bail!("{}", session.error().unwrap_or("Registration failed")),
    }
}

async fn whoami(session: &SessionManager, out: &Output, remote: bool) -> Result<()> {
    if remote {
        let user = session.profile().await.map_err(|e| match e {
            ClientError::NotAuthenticated => anyhow!("not logged in"),
            other => fail(other, "Failed to load profile"),
        })?;
        return out.emit(&user, render::user_summary);
    }

    match session.user() {
        Some(user) => out.emit(user, render::user_summary),
        None => bail!("not logged in"),
    }
}

/// 一覧の取得方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListQuery<'a> {
    Status(TaskStatus),
    Search(&'a str),
    All,
}

/// ステータス指定があればステータス、次にキーワード、どちらもなければ全件
/// キーワードは入力どおりに送る（空文字列のみ全件扱い）
fn list_query(status: Option<TaskStatus>, search: Option<&str>) -> ListQuery<'_> {
    match (status, search.filter(|keyword| !keyword.is_empty())) {
        (Some(status), _) => ListQuery::Status(status),
        (None, Some(keyword)) => ListQuery::Search(keyword),
        (None, None) => ListQuery::All,
    }
}

async fn list(
    tasks: &TaskClient,
    out: &Output,
    credentials: &Credentials,
    status: Option<TaskStatus>,
    search: Option<&str>,
) -> Result<()> {
    let result = match list_query(status, search) {
        ListQuery::Status(status) => tasks.by_status(credentials, status).await,
        ListQuery::Search(keyword) => tasks.search(credentials, keyword).await,
        ListQuery::All => tasks.list_all(credentials).await,
    };
    let found = result.map_err(|e| fail(e, "Failed to load tasks"))?;
    out.emit(&found, |found| render::task_list(found))
}

async fn create(
    tasks: &TaskClient,
    out: &Output,
    credentials: &Credentials,
    args: CreateArgs,
) -> Result<()> {
    let new_task = NewTask {
        title: args.title.trim().to_string(),
        description: args.description,
        due_date: args.due,
        status: args.status,
        remarks: args.remarks,
    };
    new_task.validate()?;

    let created = tasks
        .create(credentials, &new_task)
        .await
        .map_err(|e| fail(e, "Failed to create task"))?;
    info!(task_id = ?created.id, "task created");
    out.emit(&created, render::task_detail)
}

/// 現在のタスクを取得し、指定されたフィールドだけ差し替えて全体を送信する
async fn update(
    tasks: &TaskClient,
    out: &Output,
    credentials: &Credentials,
    args: UpdateArgs,
) -> Result<()> {
    let id = args.id;
    let task = tasks
        .get(credentials, id)
        .await
        .map_err(|e| fail(e, "Failed to load task"))?;

    let task = merge_update(task, args);
    task.validate()?;

    let updated = tasks
        .update(credentials, id, &task)
        .await
        .map_err(|e| fail(e, "Failed to update task"))?;
    info!(task_id = %id, "task updated");
    out.emit(&updated, render::task_detail)
}

/// 指定されたフィールドだけ差し替える（`--clear-due` は期限日を消す）
fn merge_update(mut task: Task, args: UpdateArgs) -> Task {
    if let Some(title) = args.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = args.description {
        task.description = description;
    }
    if args.clear_due {
        task.due_date = None;
    } else if let Some(due) = args.due {
        task.due_date = Some(due);
    }
    if let Some(status) = args.status {
        task.status = status;
    }
    if let Some(remarks) = args.remarks {
        task.remarks = remarks;
    }
    task
}

async fn delete(
    tasks: &TaskClient,
    out: &Output,
    credentials: &Credentials,
    id: TaskId,
) -> Result<()> {
    tasks
        .delete(credentials, id)
        .await
        .map_err(|e| fail(e, "Failed to delete task"))?;
    info!(task_id = %id, "task deleted");
    out.message(&format!("Deleted task #{id}"))
}

async fn range(
    tasks: &TaskClient,
    out: &Output,
    credentials: &Credentials,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    check_range(from, to)?;
    let found = tasks
        .by_date_range(credentials, from, to)
        .await
        .map_err(|e| fail(e, "Failed to load tasks"))?;
    out.emit(&found, |found| render::task_list(found))
}

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        bail!("--from must not be after --to");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Timestamp;
    use infrastructure::{MemoryStore, SessionStore, PASSWORD_KEY, USERNAME_KEY, USER_KEY};
    use std::time::Duration;

    fn session_with(store: Arc<MemoryStore>) -> SessionManager {
        let api = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        SessionManager::new(Arc::new(HttpAuthApi::new(api)), store)
    }

    fn stored_task() -> Task {
        Task {
            id: Some(TaskId(5)),
            title: "Buy milk".to_string(),
            description: "2 liters".to_string(),
            due_date: Some(Timestamp::from_string("2024-06-01T00:00:00.000Z".to_string())),
            status: TaskStatus::Pending,
            remarks: String::new(),
            created_on: Some(Timestamp::from_string("2024-05-01T10:00:00".to_string())),
            last_updated_on: None,
        }
    }

    fn no_changes() -> UpdateArgs {
        UpdateArgs {
            id: TaskId(5),
            title: None,
            description: None,
            due: None,
            clear_due: false,
            status: None,
            remarks: None,
        }
    }

    #[test]
    fn test_require_login() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session_with(store.clone());
        session.restore().unwrap();
        let error = require_login(&session).unwrap_err();
        assert!(error.to_string().starts_with("not logged in"));

        let user = serde_json::json!({
            "id": 1,
            "username": "alice",
            "email": "a@x.com",
            "createdOn": "2024-01-01T00:00:00Z"
        });
        store.set(USER_KEY, &user.to_string()).unwrap();
        store.set(USERNAME_KEY, "alice").unwrap();
        store.set(PASSWORD_KEY, "secret").unwrap();
        session.restore().unwrap();
        assert_eq!(
            require_login(&session).unwrap(),
            Credentials::new("alice", "secret")
        );
    }

    #[test]
    fn test_list_query_precedence() {
        assert_eq!(
            list_query(Some(TaskStatus::Completed), Some("milk")),
            ListQuery::Status(TaskStatus::Completed)
        );
        assert_eq!(list_query(None, Some("milk")), ListQuery::Search("milk"));
        assert_eq!(list_query(None, Some("")), ListQuery::All);
        assert_eq!(list_query(None, None), ListQuery::All);
    }

    #[test]
    fn test_list_query_sends_keyword_as_typed() {
        assert_eq!(list_query(None, Some("  ")), ListQuery::Search("  "));
        assert_eq!(list_query(None, Some(" milk ")), ListQuery::Search(" milk "));
    }

    #[test]
    fn test_merge_update_keeps_unspecified_fields() {
        let mut args = no_changes();
        args.status = Some(TaskStatus::InProgress);
        args.remarks = Some("halfway".to_string());

        let merged = merge_update(stored_task(), args);
        assert_eq!(merged.status, TaskStatus::InProgress);
        assert_eq!(merged.remarks, "halfway");
        assert_eq!(merged.title, "Buy milk");
        assert_eq!(merged.description, "2 liters");
        assert_eq!(merged.due_date, stored_task().due_date);
        assert_eq!(merged.created_on, stored_task().created_on);
        assert_eq!(merge_update(stored_task(), no_changes()), stored_task());
    }

    #[test]
    fn test_merge_update_due_date() {
        let mut args = no_changes();
        args.clear_due = true;
        assert_eq!(merge_update(stored_task(), args).due_date, None);

        let due = Timestamp::from_string("2024-07-01T09:00:00.000Z".to_string());
        let mut args = no_changes();
        args.due = Some(due.clone());
        assert_eq!(merge_update(stored_task(), args).due_date, Some(due));
    }

    #[test]
    fn test_merge_update_blank_title_fails_validation() {
        let mut args = no_changes();
        args.title = Some("   ".to_string());
        let merged = merge_update(stored_task(), args);
        assert_eq!(merged.title, "");
        assert!(merged.validate().is_err());
    }

    #[test]
    fn test_check_range() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
        assert!(check_range(day(1), day(31)).is_ok());
        assert!(check_range(day(15), day(15)).is_ok());
        assert!(check_range(day(31), day(1)).is_err());
    }

    #[test]
    fn test_fail_renders_not_found() {
        let error = fail(ClientError::from_response(404, String::new()), "Failed to load task");
        assert_eq!(error.to_string(), render::NOT_FOUND_MESSAGE);

        let error = fail(ClientError::NotFound("task 5".to_string()), "Failed to load task");
        assert_eq!(error.to_string(), "Task not found");
    }
}
