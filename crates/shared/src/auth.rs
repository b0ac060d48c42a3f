use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 各リクエストに付与する認証情報
///
/// サーバーはトークンを発行しないため、ユーザー名とパスワードを
/// HTTP Basic 認証としてリクエストごとに送信する。
/// 永続化も平文で行われる点に注意（既知の弱点）。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` ヘッダーの値を生成
    pub fn authorization_header(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

// パスワードはログに出さない
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header() {
        let credentials = Credentials::new("alice", "secret");
        assert_eq!(
            credentials.authorization_header(),
            "Basic YWxpY2U6c2VjcmV0"
        );
    }

    #[test]
    fn test_login_body_shape() {
        let credentials = Credentials::new("alice", "secret");
        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            serde_json::json!({"username": "alice", "password": "secret"})
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let output = format!("{:?}", Credentials::new("alice", "secret"));
        assert!(output.contains("alice"));
        assert!(!output.contains("secret"));
    }
}
