use crate::errors::ClientError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub environment: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テスト用に環境変数を差し替え可能）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_timeout = match lookup("TASKS_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    ClientError::Configuration(format!("invalid TASKS_HTTP_TIMEOUT_SECS: {raw}"))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            api_base_url: lookup("TASKS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            session_file: lookup("TASKS_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_file),
            http_timeout,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),
            log_format,
        })
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }
}

/// 設定ディレクトリ配下のセッションファイル
/// 設定ディレクトリが取得できない環境ではカレントディレクトリを使う
fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("task-client"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("session.json")
}
