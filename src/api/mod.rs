// Flowboard — Workflow backend abstraction

pub mod http;

use crate::model::{Workflow, WorkflowDocument, WorkflowId};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, reset...).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered `success: false`.
    #[error("{0}")]
    Server(String),
    /// Non-2xx status whose body was not a workflow envelope.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Operations the UI performs against `/api/workflows`.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// `GET /api/workflows`
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError>;

    /// `GET /api/workflows/{id}`; `Ok(None)` when the backend has no such workflow.
    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, ApiError>;

    /// `POST /api/workflows`; returns the id the backend assigned, if any.
    async fn create_workflow(
        &self,
        doc: &WorkflowDocument,
    ) -> Result<Option<WorkflowId>, ApiError>;

    /// `PUT /api/workflows/{id}` with the full document.
    async fn update_workflow(&self, id: &WorkflowId, doc: &WorkflowDocument)
        -> Result<(), ApiError>;

    /// `DELETE /api/workflows/{id}`
    async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), ApiError>;

    /// `PATCH /api/workflows/{id}/status`
    async fn set_running(&self, id: &WorkflowId, is_running: bool) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope {
    #[serde(default)]
    pub workflows: Option<Vec<Workflow>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetEnvelope {
    #[serde(default)]
    pub workflow: Option<Workflow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<WorkflowId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MutationEnvelope {
    /// Turn `success: false` into a server error carrying the backend message.
    pub fn into_result(self) -> Result<Option<WorkflowId>, ApiError> {
        if self.success {
            Ok(self.id)
        } else {
            Err(ApiError::Server(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory backend used by unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers from a canned workflow set.
    #[derive(Default)]
    pub struct FakeApi {
        pub workflows: Mutex<Vec<Workflow>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_with: Mutex<Option<String>>,
        pub next_id: Mutex<Option<WorkflowId>>,
    }

    impl FakeApi {
        pub fn with(workflows: Vec<Workflow>) -> Self {
            Self {
                workflows: Mutex::new(workflows),
                ..Default::default()
            }
        }

        pub fn fail(&self, message: &str) {
            *self.fail_with.lock().unwrap() = Some(message.to_string());
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with.lock().unwrap().clone() {
                Some(msg) => Err(ApiError::Server(msg)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl WorkflowApi for FakeApi {
        async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
            self.record("GET /api/workflows".into())?;
            Ok(self.workflows.lock().unwrap().clone())
        }

        async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, ApiError> {
            self.record(format!("GET /api/workflows/{}", id))?;
            Ok(self
                .workflows
                .lock()
                .unwrap()
                .iter()
                .find(|w| &w.id == id)
                .cloned())
        }

        async fn create_workflow(
            &self,
            _doc: &WorkflowDocument,
        ) -> Result<Option<WorkflowId>, ApiError> {
            self.record("POST /api/workflows".into())?;
            Ok(self.next_id.lock().unwrap().clone())
        }

        async fn update_workflow(
            &self,
            id: &WorkflowId,
            _doc: &WorkflowDocument,
        ) -> Result<(), ApiError> {
            self.record(format!("PUT /api/workflows/{}", id))
        }

        async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), ApiError> {
            self.record(format!("DELETE /api/workflows/{}", id))
        }

        async fn set_running(&self, id: &WorkflowId, is_running: bool) -> Result<(), ApiError> {
            self.record(format!("PATCH /api/workflows/{}/status {}", id, is_running))
        }
    }
}
