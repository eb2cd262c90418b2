use serde::de::DeserializeOwned;
use soc_core::{
    AuthGrant, ClientRecord, DeleteOutcome, ErrorBody, LogRecord, SessionRecord, StatusReport,
    SyncTopology,
};
use std::time::Duration;
use thiserror::Error;

pub const TOKEN_HEADER: &str = "X-Snare-Token";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication rejected ({status})")]
    Auth { status: u16, message: Option<String> },
    #[error("request failed ({status})")]
    Status { status: u16, message: Option<String> },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiError::Auth { message, .. } | ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    fn from_status(status: u16, body: Option<ErrorBody>) -> Self {
        let message = body.map(|body| body.error);
        if status == 401 || status == 403 {
            ApiError::Auth { status, message }
        } else {
            ApiError::Status { status, message }
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(Self { http, base })
    }

    pub async fn clients(&self, token: Option<&str>) -> Result<Vec<ClientRecord>, ApiError> {
        self.get("/api/clients", token).await
    }

    pub async fn sessions(&self, token: Option<&str>) -> Result<Vec<SessionRecord>, ApiError> {
        self.get("/api/sessions", token).await
    }

    pub async fn sync(&self, token: Option<&str>) -> Result<SyncTopology, ApiError> {
        self.get("/api/sync", token).await
    }

    pub async fn logs(&self, token: Option<&str>) -> Result<Vec<LogRecord>, ApiError> {
        self.get("/api/logs", token).await
    }

    pub async fn status(&self, token: Option<&str>) -> Result<StatusReport, ApiError> {
        self.get("/api/status", token).await
    }

    pub async fn login(&self, password: &str) -> Result<AuthGrant, ApiError> {
        let response = self
            .http
            .post(self.url("/api/auth"))
            .json(&serde_json::json!({ "Password": password }))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_client(
        &self,
        token: Option<&str>,
        address: &str,
    ) -> Result<DeleteOutcome, ApiError> {
        let request = self
            .http
            .delete(self.url("/api/client"))
            .query(&[("client", address)]);
        let response = Self::attach_token(request, token).send().await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, ApiError> {
        let request = Self::attach_token(self.http.get(self.url(path)), token);
        let response = request.send().await?;
        Self::decode(response).await
    }

    fn attach_token(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => request.header(TOKEN_HEADER, token),
            _ => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.json::<ErrorBody>().await.ok();
        Err(ApiError::from_status(status.as_u16(), body))
    }
}
