use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use shared::{telemetry, ClientError, Config, Credentials};
use std::time::{Duration, Instant};
use tracing::Instrument;

const USER_AGENT: &str = concat!("task-client/", env!("CARGO_PKG_VERSION"));

/// Task Management API への HTTP トランスポート
///
/// 認証情報は暗黙のデフォルトヘッダーとして保持せず、
/// 呼び出しごとに引数として受け取ってリクエストに付与する。
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Self::with_timeout(&config.api_base_url, config.http_timeout)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid API base URL {base_url}: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET してレスポンスボディをそのまま返す
    pub async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
        credentials: Option<&Credentials>,
    ) -> Result<String, ClientError> {
        let builder = self.client.get(self.url(path)).query(query);
        self.execute(Method::GET, path, builder, credentials).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        credentials: Option<&Credentials>,
    ) -> Result<T, ClientError> {
        let body = self.get_text(path, query, credentials).await?;
        decode(&body)
    }

    /// JSON ボディ付きで送信し、JSON レスポンスを返す（POST / PUT）
    pub async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.client.request(method.clone(), self.url(path)).json(body);
        let text = self.execute(method, path, builder, credentials).await?;
        decode(&text)
    }

    /// DELETE（レスポンスボディは使わない）
    pub async fn delete(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), ClientError> {
        let builder = self.client.delete(self.url(path));
        self.execute(Method::DELETE, path, builder, credentials)
            .await
            .map(|_| ())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
        credentials: Option<&Credentials>,
    ) -> Result<String, ClientError> {
        let span = telemetry::create_request_span(
            method.as_str(),
            path,
            credentials.map(|c| c.username.as_str()),
        );

        async move {
            let builder = match credentials {
                Some(credentials) => {
                    builder.header(header::AUTHORIZATION, credentials.authorization_header())
                }
                None => builder,
            };

            let started = Instant::now();
            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    telemetry::trace_transport_failure(method.as_str(), path, &e, started.elapsed());
                    return Err(e.into());
                }
            };

            let status = response.status();
            let body = response.text().await?;
            telemetry::trace_http_request(method.as_str(), path, status.as_u16(), started.elapsed());

            if status.is_success() {
                Ok(body)
            } else {
                Err(ClientError::from_response(status.as_u16(), body))
            }
        }
        .instrument(span)
        .await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Deserialization(e.to_string()))
}
