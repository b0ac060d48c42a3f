use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// 認証済みユーザーの情報（`/api/auth/login` の `user` オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_on: Timestamp,
}

/// 新規登録レスポンス
/// サーバーは `message`, `userId`, `username`, `email` を返す
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
