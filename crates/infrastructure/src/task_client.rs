use crate::http::ApiClient;
use chrono::NaiveDate;
use domain::{NewTask, Task, TaskId, TaskStats, TaskStatus};
use reqwest::Method;
use shared::{ClientError, Credentials};
use tracing::debug;

const TASKS_PATH: &str = "/api/tasks";

/// タスク API のリクエストビルダー
///
/// 状態を持たず、各操作は 1 回のリクエスト/レスポンスに対応する。
/// リトライ・キャッシュ・ページングは行わず、失敗はそのまま呼び出し元へ返す。
#[derive(Debug, Clone)]
pub struct TaskClient {
    api: ApiClient,
}

impl TaskClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// 全件取得
    pub async fn list_all(&self, credentials: &Credentials) -> Result<Vec<Task>, ClientError> {
        self.api.get_json(TASKS_PATH, &[], Some(credentials)).await
    }

    /// ID で取得
    /// 404 のほか、ボディが空または `null` の場合も見つからない扱い
    pub async fn get(&self, credentials: &Credentials, id: TaskId) -> Result<Task, ClientError> {
        let path = task_path(id);
        let body = self.api.get_text(&path, &[], Some(credentials)).await?;

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!(task_id = %id, "empty task lookup body");
            return Err(ClientError::NotFound(format!("task {id}")));
        }

        serde_json::from_str(trimmed).map_err(|e| ClientError::Deserialization(e.to_string()))
    }

    /// 作成（id とタイムスタンプはサーバーが付与）
    pub async fn create(
        &self,
        credentials: &Credentials,
        task: &NewTask,
    ) -> Result<Task, ClientError> {
        self.api
            .send_json(Method::POST, TASKS_PATH, task, Some(credentials))
            .await
    }

    /// 全フィールドを送信して更新
    pub async fn update(
        &self,
        credentials: &Credentials,
        id: TaskId,
        task: &Task,
    ) -> Result<Task, ClientError> {
        self.api
            .send_json(Method::PUT, &task_path(id), task, Some(credentials))
            .await
    }

    pub async fn delete(&self, credentials: &Credentials, id: TaskId) -> Result<(), ClientError> {
        self.api.delete(&task_path(id), Some(credentials)).await
    }

    /// キーワード検索
    pub async fn search(
        &self,
        credentials: &Credentials,
        keyword: &str,
    ) -> Result<Vec<Task>, ClientError> {
        let path = format!("{TASKS_PATH}/search");
        self.api
            .get_json(&path, &[("keyword", keyword.to_string())], Some(credentials))
            .await
    }

    /// ステータスで絞り込み
    pub async fn by_status(
        &self,
        credentials: &Credentials,
        status: TaskStatus,
    ) -> Result<Vec<Task>, ClientError> {
        let path = format!("{TASKS_PATH}/status/{}", status.as_str());
        self.api.get_json(&path, &[], Some(credentials)).await
    }

    /// 期限日の範囲で絞り込み（両端を含む）
    pub async fn by_date_range(
        &self,
        credentials: &Credentials,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Task>, ClientError> {
        let path = format!("{TASKS_PATH}/date-range");
        let query = [
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ];
        self.api.get_json(&path, &query, Some(credentials)).await
    }

    /// ステータスごとの件数
    pub async fn stats(&self, credentials: &Credentials) -> Result<TaskStats, ClientError> {
        let path = format!("{TASKS_PATH}/stats");
        self.api.get_json(&path, &[], Some(credentials)).await
    }
}

fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}
