//! Client for the interview platform HTTP API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::endpoints::{self, session_path};
use crate::error::InterviewApiError;
use crate::types::{
    ApiEnvelope, AuthSession, CreateSessionRequest, CreatedSession, ErrorBody, EvaluationResult,
    FinalizedSession, LoginRequest, Page, PersistAnswerRequest, QuestionSet, SavedAnswer,
    SessionSummary, TemplateSummary, DEFAULT_PAGE_SIZE,
};

/// Client for the interview practice platform.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    /// HTTP client for making requests
    http_client: reqwest::Client,
    /// API root, always ending with `/`
    base_url: Url,
    /// Bearer token sent with every request when present
    token: Option<String>,
}

impl Client {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, InterviewApiError> {
        Self::build(base_url, None)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, InterviewApiError> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self, InterviewApiError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(InterviewApiError::ConfigError(format!(
                "'{}' cannot be used as an API base URL",
                base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(InterviewApiError::HttpError)?;

        Ok(Self {
            http_client,
            base_url,
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a session from a template or a level/stack pair.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreatedSession, InterviewApiError> {
        tracing::debug!("[api] create session: {:?}", request);
        self.post(endpoints::INTERVIEWS, request).await
    }

    /// Fetch the ordered question set of a session.
    pub async fn fetch_questions(&self, session_id: &str) -> Result<QuestionSet, InterviewApiError> {
        let result = self
            .get(&session_path(endpoints::QUESTIONS, &encode(session_id)), &[])
            .await;
        session_lookup(result, session_id)
    }

    /// List the caller's sessions, most recent first.
    pub async fn list_sessions(
        &self,
        per_page: u32,
    ) -> Result<Page<SessionSummary>, InterviewApiError> {
        self.get(endpoints::INTERVIEWS, &[("per_page", per_page.to_string())])
            .await
    }

    /// Fetch one session's metadata.
    ///
    /// The platform has no direct endpoint for this, so the recent-session
    /// listing is searched instead.
    pub async fn fetch_session(&self, session_id: &str) -> Result<SessionSummary, InterviewApiError> {
        let page = self.list_sessions(DEFAULT_PAGE_SIZE).await?;
        page.items
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| {
                InterviewApiError::NotFound(format!(
                    "session {} not found in recent interviews",
                    session_id
                ))
            })
    }

    /// Persist one answer.
    pub async fn persist_answer(
        &self,
        session_id: &str,
        request: &PersistAnswerRequest,
    ) -> Result<SavedAnswer, InterviewApiError> {
        self.post(&session_path(endpoints::ANSWER, &encode(session_id)), request)
            .await
    }

    /// Finalize a session. The platform accepts no writes afterwards.
    pub async fn finalize_session(
        &self,
        session_id: &str,
    ) -> Result<FinalizedSession, InterviewApiError> {
        let url = self.endpoint_url(&session_path(endpoints::SUBMIT, &encode(session_id)))?;
        self.send(self.http_client.post(url)).await
    }

    /// Fetch the evaluation of a session.
    pub async fn fetch_result(&self, session_id: &str) -> Result<EvaluationResult, InterviewApiError> {
        let result = self
            .get(&session_path(endpoints::RESULT, &encode(session_id)), &[])
            .await;
        session_lookup(result, session_id)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, InterviewApiError> {
        self.post(endpoints::LOGIN, request).await
    }

    /// List active interview templates.
    pub async fn list_templates(&self) -> Result<Page<TemplateSummary>, InterviewApiError> {
        self.get(endpoints::TEMPLATES, &[("status", "active".to_string())])
            .await
    }

    /// Resolve a path against the API root.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, InterviewApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build headers, with authentication when a token is set.
    fn build_headers(&self) -> Result<HeaderMap, InterviewApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| InterviewApiError::ConfigError(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, InterviewApiError> {
        let url = self.endpoint_url(path)?;
        self.send(self.http_client.get(url).query(query)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, InterviewApiError> {
        let url = self.endpoint_url(path)?;
        self.send(self.http_client.post(url).json(body)).await
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, InterviewApiError> {
        let response = request.headers(self.build_headers()?).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::debug!("[api] {} -> {}", status, message);
            return Err(InterviewApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

/// On reads, a 404 means the session does not exist. Writes keep the status.
fn session_lookup<T>(
    result: Result<T, InterviewApiError>,
    session_id: &str,
) -> Result<T, InterviewApiError> {
    result.map_err(|err| match err {
        InterviewApiError::ApiError { status: 404, message } => {
            InterviewApiError::NotFound(format!("session {}: {}", session_id, message))
        }
        other => other,
    })
}

/// Percent-encode a value used as a single path segment.
fn encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
