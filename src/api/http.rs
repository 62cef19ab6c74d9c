// Flowboard — HTTP workflow backend (reqwest)

use super::*;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use url::Url;

/// Talks JSON to a `/api/workflows` backend. No timeouts and no retries:
/// every failure is reported once and left to the user to retry.
pub struct HttpWorkflowApi {
    base: Url,
    client: Client,
}

impl HttpWorkflowApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            client: Client::builder().build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn workflow_path(id: &WorkflowId) -> String {
        format!("api/workflows/{}", urlencoding::encode(id.as_str()))
    }

    /// Mutations: the `{success, error}` envelope is read whatever the status.
    async fn send<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (status, text) = self.fetch(method, url, body).await?;
        parse_body(status, &text)
    }

    async fn fetch<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(StatusCode, String), ApiError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(method = %method, url = %url, "Sending workflow request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(method = %method, url = %url, status = %status, body_len = text.len(), "Workflow response received");

        Ok((status, text))
    }
}

/// Parse the JSON envelope regardless of status; fall back to a status
/// error only when a failing response is not an envelope at all.
fn parse_body<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ApiError> {
    match serde_json::from_str::<T>(text) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body: text.chars().take(200).collect(),
        }),
        Err(e) => Err(ApiError::Decode(e)),
    }
}

/// Reads have fully defaulted envelopes, so a failing status must never
/// be parsed as data. The backend's `error` text is kept when present.
fn parse_read<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ApiError> {
    if status.is_success() {
        return parse_body(status, text);
    }
    match serde_json::from_str::<MutationEnvelope>(text) {
        Ok(MutationEnvelope {
            error: Some(error), ..
        }) if !error.is_empty() => Err(ApiError::Server(error)),
        _ => Err(ApiError::Status {
            status: status.as_u16(),
            body: text.chars().take(200).collect(),
        }),
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        let url = self.endpoint("api/workflows")?;
        let (status, text) = self.fetch(Method::GET, url, None::<&()>).await?;
        let envelope: ListEnvelope = parse_read(status, &text)?;
        Ok(envelope.workflows.unwrap_or_default())
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, ApiError> {
        let url = self.endpoint(&Self::workflow_path(id))?;
        let (status, text) = self.fetch(Method::GET, url, None::<&()>).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: GetEnvelope = parse_read(status, &text)?;
        Ok(envelope.workflow)
    }

    async fn create_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<Option<WorkflowId>, ApiError> {
        let url = self.endpoint("api/workflows")?;
        let envelope: MutationEnvelope = self.send(Method::POST, url, Some(doc)).await?;
        envelope.into_result()
    }

    async fn update_workflow(
        &self,
        id: &WorkflowId,
        doc: &WorkflowDocument,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&Self::workflow_path(id))?;
        let envelope: MutationEnvelope = self.send(Method::PUT, url, Some(doc)).await?;
        envelope.into_result().map(|_| ())
    }

    async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), ApiError> {
        let url = self.endpoint(&Self::workflow_path(id))?;
        let envelope: MutationEnvelope = self.send(Method::DELETE, url, None::<&()>).await?;
        envelope.into_result().map(|_| ())
    }

    async fn set_running(&self, id: &WorkflowId, is_running: bool) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("{}/status", Self::workflow_path(id)))?;
        let body = json!({ "isRunning": is_running });
        let envelope: MutationEnvelope = self.send(Method::PATCH, url, Some(&body)).await?;
        envelope.into_result().map(|_| ())
    }
}
