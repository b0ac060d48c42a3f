use crate::http::ApiClient;
use async_trait::async_trait;
use domain::{Registration, User};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use shared::{ClientError, Credentials};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const PROFILE_PATH: &str = "/api/auth/profile";

/// `/api/auth/login` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// `/api/auth/register` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 認証エンドポイントの抽象
/// `SessionManager` はこのトレイト経由で呼び出すため、テストでは差し替えられる
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError>;
    async fn register(&self, request: &RegisterRequest) -> Result<Registration, ClientError>;
    async fn profile(&self, credentials: &Credentials) -> Result<User, ClientError>;
}

/// HTTP 経由の実装
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    api: ApiClient,
}

impl HttpAuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        // ログイン自体はボディで認証するため Authorization ヘッダーは付けない
        self.api
            .send_json(Method::POST, LOGIN_PATH, credentials, None)
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Registration, ClientError> {
        self.api
            .send_json(Method::POST, REGISTER_PATH, request, None)
            .await
    }

    async fn profile(&self, credentials: &Credentials) -> Result<User, ClientError> {
        self.api
            .get_json(PROFILE_PATH, &[], Some(credentials))
            .await
    }
}
