use crate::config::EngineConfig;
use crate::dto::backend_dto::{SaveAnswerRequest, SubmitSessionRequest};
use crate::error::{Error, Result};
use crate::models::answer::AnswerRecord;
use crate::models::question::{ActivityMeta, Question, QuizSettings};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// The external collaborator holding assessment definitions and attempt
/// state. The engine only ever talks to it through this seam; tests plug in
/// a recording fake, production uses [`HttpBackend`].
pub trait AssessmentBackend: Send + Sync + 'static {
    fn fetch_activity(&self, id: Uuid) -> impl Future<Output = Result<ActivityMeta>> + Send;

    fn fetch_questions(&self, id: Uuid) -> impl Future<Output = Result<Vec<Question>>> + Send;

    fn fetch_settings(&self, id: Uuid) -> impl Future<Output = Result<QuizSettings>> + Send;

    /// Attempt-logging signal. Fire-and-forget from the session's point of
    /// view; a failure never blocks entering the session.
    fn signal_start(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;

    fn save_answer(&self, id: Uuid, record: AnswerRecord)
        -> impl Future<Output = Result<()>> + Send;

    fn submit_session(
        &self,
        id: Uuid,
        answers: Vec<AnswerRecord>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP implementation of [`AssessmentBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.authorize(self.client.get(self.url(path))).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("GET {}", path)));
        }
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }
}

impl AssessmentBackend for HttpBackend {
    async fn fetch_activity(&self, id: Uuid) -> Result<ActivityMeta> {
        self.get_json(&format!("/api/assessments/{}", id)).await
    }

    async fn fetch_questions(&self, id: Uuid) -> Result<Vec<Question>> {
        self.get_json(&format!("/api/assessments/{}/questions", id))
            .await
    }

    async fn fetch_settings(&self, id: Uuid) -> Result<QuizSettings> {
        self.get_json(&format!("/api/assessments/{}/settings", id))
            .await
    }

    async fn signal_start(&self, id: Uuid) -> Result<()> {
        let path = format!("/api/assessments/{}/start", id);
        let resp = self
            .authorize(self.client.post(self.url(&path)))
            .send()
            .await?;
        resp.error_for_status()?;
        Ok(())
    }

    async fn save_answer(&self, id: Uuid, record: AnswerRecord) -> Result<()> {
        let path = format!("/api/assessments/{}/answer", id);
        let body = SaveAnswerRequest::from_record(&record)?;
        let resp = self
            .authorize(self.client.patch(self.url(&path)))
            .json(&body)
            .send()
            .await?;
        resp.error_for_status()?;
        Ok(())
    }

    async fn submit_session(&self, id: Uuid, answers: Vec<AnswerRecord>) -> Result<()> {
        let path = format!("/api/assessments/{}/submit", id);
        let body = SubmitSessionRequest {
            answers: answers
                .iter()
                .map(SaveAnswerRequest::from_record)
                .collect::<Result<Vec<_>>>()?,
        };
        let resp = self
            .authorize(self.client.post(self.url(&path)))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;
        resp.error_for_status()
            .map_err(|e| Error::Submission(e.to_string()))?;
        Ok(())
    }
}
