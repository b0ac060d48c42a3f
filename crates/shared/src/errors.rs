use serde::Deserialize;
use thiserror::Error;

/// 予期しない失敗（ネットワーク障害など）のときに表示するメッセージ
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// クライアント全体で使用されるエラー型
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    // サーバーが応答したエラー
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no error message"))]
    Api {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // 通信エラー
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ローカルの状態
    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// サーバーが `error` フィールド付きの JSON を返した
    Structured,
    /// それ以外の失敗（汎用メッセージで表示）
    Unstructured,
    /// 該当データなし
    NotFound,
}

/// サーバーのエラーボディ `{ "error": "..." }`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

impl ClientError {
    /// 非 2xx レスポンスからエラーを組み立てる
    pub fn from_response(status: u16, body: String) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error);

        ClientError::Api {
            status,
            message,
            body,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::NotFound(_) => ErrorCategory::NotFound,
            ClientError::Api { status: 404, .. } => ErrorCategory::NotFound,
            ClientError::Api {
                message: Some(_), ..
            } => ErrorCategory::Structured,
            _ => ErrorCategory::Unstructured,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// HTTP ステータス（サーバーが応答した場合のみ）
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// サーバーが返した `error` メッセージ
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// ユーザー向けメッセージを取得
    ///
    /// サーバーが応答した場合は `error` フィールド、なければ `rejected`。
    /// 応答自体がない場合は汎用メッセージ。
    pub fn failure_message(&self, rejected: &str) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Api { .. } => rejected.to_string(),
            _ => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout(error.to_string())
        } else if error.is_decode() {
            ClientError::Deserialization(error.to_string())
        } else {
            ClientError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Deserialization(error.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_api_error() {
        let error = ClientError::from_response(
            400,
            r#"{"error":"Invalid username or password"}"#.to_string(),
        );

        assert_eq!(error.category(), ErrorCategory::Structured);
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.api_message(), Some("Invalid username or password"));
        assert_eq!(
            error.failure_message("Login failed"),
            "Invalid username or password"
        );
    }

    #[test]
    fn test_unstructured_api_error_uses_fallback() {
        let error = ClientError::from_response(
            400,
            "Username, password, and email are required".to_string(),
        );

        assert_eq!(error.category(), ErrorCategory::Unstructured);
        assert_eq!(error.api_message(), None);
        assert_eq!(
            error.failure_message("Registration failed"),
            "Registration failed"
        );
    }

    #[test]
    fn test_network_error_uses_generic_message() {
        let error = ClientError::Network("connection refused".to_string());
        assert_eq!(error.category(), ErrorCategory::Unstructured);
        assert_eq!(error.failure_message("Login failed"), UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_not_found_classification() {
        assert!(ClientError::from_response(404, String::new()).is_not_found());
        assert!(ClientError::NotFound("task 1".to_string()).is_not_found());
        assert!(!ClientError::from_response(500, String::new()).is_not_found());
    }

    #[test]
    fn test_display_keeps_server_message() {
        let error = ClientError::from_response(400, r#"{"error":"boom"}"#.to_string());
        assert_eq!(error.to_string(), "API error (400): boom");
    }
}
