//! セッション管理
//!
//! 認証済みユーザーと認証情報を保持し、セッションストアを介して
//! プロセスの再起動後も復元できるようにする。
//!
//! 注意: サーバーはトークンを発行しないため、認証情報（パスワードを含む）を
//! 平文のまま保存し、以降のすべてのリクエストで Basic 認証として送信する。

use crate::auth_api::{AuthApi, RegisterRequest};
use crate::storage::{SessionStore, PASSWORD_KEY, USERNAME_KEY, USER_KEY};
use domain::{Registration, User};
use shared::{ClientError, Credentials};
use std::sync::Arc;
use tracing::{error, info, warn};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// セッションの状態
/// ユーザー情報と認証情報は必ず揃って存在する
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { user: User, credentials: Credentials },
}

pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    state: SessionState,
    error: Option<String>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            auth,
            store,
            state: SessionState::Anonymous,
            error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            SessionState::Anonymous => None,
        }
    }

    /// 以降のリクエストに付与する認証情報
    pub fn credentials(&self) -> Option<&Credentials> {
        match &self.state {
            SessionState::Authenticated { credentials, .. } => Some(credentials),
            SessionState::Anonymous => None,
        }
    }

    /// 直近の login / register の失敗メッセージ
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 保存済みのセッションを復元する
    ///
    /// `user`, `username`, `password` が揃っていれば認証済みとする。
    /// ストアへの書き込みは行わないため、何度呼んでも結果は同じ。
    /// ストアを読めない場合は未認証として扱う（logout / login で上書きできる）。
    pub fn restore(&mut self) -> Result<bool, ClientError> {
        let stored = self.store.get(USER_KEY).and_then(|user| {
            Ok((user, self.store.get(USERNAME_KEY)?, self.store.get(PASSWORD_KEY)?))
        });
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "session store is unreadable, treating session as anonymous");
                self.state = SessionState::Anonymous;
                return Ok(false);
            }
        };

        self.state = match stored {
            (Some(raw_user), Some(username), Some(password)) => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => SessionState::Authenticated {
                        user,
                        credentials: Credentials::new(username, password),
                    },
                    Err(e) => {
                        warn!(error = %e, "stored user record is unreadable, treating session as anonymous");
                        SessionState::Anonymous
                    }
                }
            }
            _ => SessionState::Anonymous,
        };

        Ok(self.is_authenticated())
    }

    /// ログインする
    ///
    /// 失敗してもエラーを返さず、`error()` にメッセージを設定する。
    /// 戻り値は認証済みかどうか。
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        self.error = None;
        let credentials = Credentials::new(username, password);

        match self.auth.login(&credentials).await {
            Ok(response) => {
                // user を含まない成功レスポンスでは何もしない
                let Some(user) = response.user else {
                    warn!(username = username, "login response did not contain a user");
                    return self.is_authenticated();
                };

                if let Err(e) = self.persist(&user, &credentials) {
                    error!(error = %e, "failed to persist session");
                    self.error = Some(e.failure_message(LOGIN_FAILED));
                    return self.is_authenticated();
                }

                info!(user_id = user.id, username = %user.username, "logged in");
                self.state = SessionState::Authenticated { user, credentials };
                true
            }
            Err(e) => {
                error!(error = %e, "login error");
                self.error = Some(e.failure_message(LOGIN_FAILED));
                self.is_authenticated()
            }
        }
    }

    /// ユーザー登録する
    ///
    /// 成功してもログインはしない（セッションは変化しない）。
    /// 失敗時は `error()` にメッセージを設定したうえでエラーを返す。
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, ClientError> {
        self.error = None;
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.auth.register(&request).await {
            Ok(registration) => {
                info!(username = username, "registered");
                Ok(registration)
            }
            Err(e) => {
                error!(error = %e, "registration error");
                self.error = Some(e.failure_message(REGISTRATION_FAILED));
                Err(e)
            }
        }
    }

    /// ログアウトする
    /// メモリ上の状態は必ず破棄し、その後ストアから削除する
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.state = SessionState::Anonymous;
        self.error = None;

        for key in [USER_KEY, USERNAME_KEY, PASSWORD_KEY] {
            self.store.remove(key)?;
        }
        info!("logged out");
        Ok(())
    }

    /// サーバー上の最新プロフィールを取得する
    pub async fn profile(&self) -> Result<User, ClientError> {
        let credentials = self.credentials().ok_or(ClientError::NotAuthenticated)?;
        self.auth.profile(credentials).await
    }

    /// 3 つのキーを保存する。途中で失敗した場合は書き込んだキーを消す
    fn persist(&self, user: &User, credentials: &Credentials) -> Result<(), ClientError> {
        let result = self.write_keys(user, credentials);
        if result.is_err() {
            for key in [USER_KEY, USERNAME_KEY, PASSWORD_KEY] {
                if let Err(e) = self.store.remove(key) {
                    warn!(key = key, error = %e, "failed to clean up partial session");
                }
            }
        }
        result
    }

    fn write_keys(&self, user: &User, credentials: &Credentials) -> Result<(), ClientError> {
        let raw_user =
            serde_json::to_string(user).map_err(|e| ClientError::Serialization(e.to_string()))?;
        self.store.set(USER_KEY, &raw_user)?;
        self.store.set(USERNAME_KEY, &credentials.username)?;
        self.store.set(PASSWORD_KEY, &credentials.password)?;
        Ok(())
    }
}
