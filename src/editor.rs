// Flowboard — Workflow editor state: steps, dirty tracking, validation, save

use crate::api::{ApiError, WorkflowApi};
use crate::model::{
    Assignee, Executor, Human, Step, StepId, StepIdGenerator, Workflow, WorkflowDocument,
    WorkflowDraft, WorkflowId,
};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a workflow title")]
    EmptyTitle,
    #[error("Please fill in all step instructions")]
    EmptyInstruction,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A save is already in progress")]
    SaveInProgress,
    #[error("The workflow is still loading")]
    Loading,
    #[error("Error saving workflow: {0}")]
    Save(#[from] ApiError),
}

/// How the editor got its initial contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Opened without an id.
    Fresh,
    Loaded,
    /// The backend had no such workflow; a default was substituted.
    NotFound,
    /// The fetch failed; a default was substituted.
    Failed(String),
}

/// One field change on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepField {
    Instruction(String),
    Executor(Executor),
    AssignedHuman(Human),
}

/// Result of asking to leave the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Leave,
    ConfirmDiscard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorTimings {
    pub saved_indicator: Duration,
    pub auto_return: Duration,
}

impl Default for EditorTimings {
    fn default() -> Self {
        Self {
            saved_indicator: Duration::from_millis(2000),
            auto_return: Duration::from_millis(1000),
        }
    }
}

/// A validated save, ready to be sent. Holds the exact draft that was sent
/// so the clean snapshot matches what the backend stored.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub target: Option<WorkflowId>,
    pub document: WorkflowDocument,
    sent: WorkflowDraft,
}

impl SaveRequest {
    /// Update when the id is known, create otherwise. Returns the id a
    /// create handed back.
    pub async fn send(&self, api: &dyn WorkflowApi) -> Result<Option<WorkflowId>, ApiError> {
        match &self.target {
            Some(id) => api.update_workflow(id, &self.document).await.map(|_| None),
            None => api.create_workflow(&self.document).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Id adopted from a create response.
    pub created: Option<WorkflowId>,
    /// A brand-new workflow was saved; the editor will ask to return home.
    pub returns_home: bool,
}

pub struct WorkflowEditor {
    initial_id: Option<WorkflowId>,
    workflow_id: Option<WorkflowId>,
    draft: WorkflowDraft,
    snapshot: WorkflowDraft,
    loading: bool,
    saving: bool,
    load_outcome: LoadOutcome,
    ids: StepIdGenerator,
    timings: EditorTimings,
    saved_until: Option<Instant>,
    return_at: Option<Instant>,
}

impl WorkflowEditor {
    /// Open the editor. With an id the editor stays in `loading` until
    /// [`finish_load`](Self::finish_load); without one it starts from the default.
    pub fn new(id: Option<WorkflowId>, timings: EditorTimings) -> Self {
        let mut ids = StepIdGenerator::seeded(std::iter::empty());
        let draft = WorkflowDraft::synthesized(&mut ids);
        Self {
            loading: id.is_some(),
            initial_id: id.clone(),
            workflow_id: id,
            snapshot: draft.clone(),
            draft,
            saving: false,
            load_outcome: LoadOutcome::Fresh,
            ids,
            timings,
            saved_until: None,
            return_at: None,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    pub fn finish_load(&mut self, result: Result<Option<Workflow>, ApiError>) {
        match result {
            Ok(Some(workflow)) => {
                let mut draft = WorkflowDraft::from(workflow);
                self.ids = StepIdGenerator::seeded(draft.steps.iter().map(|s| &s.id));
                if draft.steps.is_empty() {
                    draft.steps.push(Step::new(self.ids.next_id(), ""));
                }
                self.draft = draft;
                self.load_outcome = LoadOutcome::Loaded;
            }
            Ok(None) => {
                tracing::warn!(workflow = ?self.workflow_id, "Workflow not found, starting from default");
                self.draft = WorkflowDraft::synthesized(&mut self.ids);
                self.load_outcome = LoadOutcome::NotFound;
            }
            Err(e) => {
                tracing::warn!(workflow = ?self.workflow_id, "Error loading workflow: {}", e);
                self.draft = WorkflowDraft::synthesized(&mut self.ids);
                self.load_outcome = LoadOutcome::Failed(e.to_string());
            }
        }
        self.snapshot = self.draft.clone();
        self.loading = false;
    }

    pub async fn load(&mut self, api: &dyn WorkflowApi) {
        let Some(id) = self.initial_id.clone() else {
            return;
        };
        let result = api.get_workflow(&id).await;
        self.finish_load(result);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Id the editor was opened with.
    pub fn initial_id(&self) -> Option<&WorkflowId> {
        self.initial_id.as_ref()
    }

    /// Id used for the next save; adopted from a create response.
    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    pub fn heading(&self) -> &'static str {
        if self.initial_id.is_some() {
            "Edit Workflow"
        } else {
            "Create Workflow"
        }
    }

    pub fn draft(&self) -> &WorkflowDraft {
        &self.draft
    }

    pub fn title(&self) -> &str {
        &self.draft.title
    }

    pub fn steps(&self) -> &[Step] {
        &self.draft.steps
    }

    pub fn is_playbook_workflow(&self) -> bool {
        self.draft.is_playbook_workflow
    }

    /// Shown read-only for playbook workflows that carry one.
    pub fn playbook_description(&self) -> Option<&str> {
        let desc = self.draft.playbook_description.as_str();
        (self.draft.is_playbook_workflow && !desc.is_empty()).then_some(desc)
    }

    pub fn is_dirty(&self) -> bool {
        !self.loading && self.draft != self.snapshot
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Playbook titles are read-only; returns whether the title changed.
    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        if self.draft.is_playbook_workflow {
            return false;
        }
        self.draft.title = title.into();
        true
    }

    pub fn add_step(&mut self) -> StepId {
        let id = self.ids.next_id();
        self.draft.steps.push(Step::new(id, ""));
        id
    }

    pub fn update_step(&mut self, id: StepId, field: StepField) -> bool {
        let Some(step) = self.draft.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        match field {
            StepField::Instruction(text) => step.instruction = text,
            StepField::Executor(executor) => step.set_executor(executor),
            StepField::AssignedHuman(human) => step.assignee = Assignee::Human(human),
        }
        true
    }

    /// The last remaining step cannot be deleted.
    pub fn delete_step(&mut self, id: StepId) -> bool {
        if self.draft.steps.len() <= 1 {
            return false;
        }
        let before = self.draft.steps.len();
        self.draft.steps.retain(|s| s.id != id);
        self.draft.steps.len() != before
    }

    pub fn move_step_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.draft.steps.len() {
            return false;
        }
        self.draft.steps.swap(index, index - 1);
        true
    }

    pub fn move_step_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.draft.steps.len() {
            return false;
        }
        self.draft.steps.swap(index, index + 1);
        true
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.draft.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self
            .draft
            .steps
            .iter()
            .any(|s| s.instruction.trim().is_empty())
        {
            return Err(ValidationError::EmptyInstruction);
        }
        Ok(())
    }

    /// Validate and mark the editor as saving. Nothing is sent on error.
    pub fn begin_save(&mut self) -> Result<SaveRequest, EditorError> {
        if self.loading {
            return Err(EditorError::Loading);
        }
        if self.saving {
            return Err(EditorError::SaveInProgress);
        }
        self.validate()?;

        self.saving = true;
        Ok(SaveRequest {
            target: self.workflow_id.clone(),
            document: self.draft.document(),
            sent: self.draft.clone(),
        })
    }

    pub fn finish_save(
        &mut self,
        request: SaveRequest,
        result: Result<Option<WorkflowId>, ApiError>,
        now: Instant,
    ) -> Result<SaveOutcome, EditorError> {
        self.saving = false;
        let returned_id = match result {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(workflow = ?request.target, "Save error: {}", e);
                return Err(EditorError::Save(e));
            }
        };

        let mut created = None;
        if self.workflow_id.is_none() {
            if let Some(id) = returned_id {
                self.workflow_id = Some(id.clone());
                created = Some(id);
            }
        }

        self.snapshot = request.sent;
        self.saved_until = Some(now + self.timings.saved_indicator);

        let returns_home = self.initial_id.is_none();
        if returns_home {
            self.return_at = Some(now + self.timings.auto_return);
        }

        tracing::info!(workflow = ?self.workflow_id, "Workflow saved");
        Ok(SaveOutcome {
            created,
            returns_home,
        })
    }

    pub async fn save(
        &mut self,
        api: &dyn WorkflowApi,
        now: Instant,
    ) -> Result<SaveOutcome, EditorError> {
        let request = self.begin_save()?;
        let result = request.send(api).await;
        self.finish_save(request, result, now)
    }

    // -----------------------------------------------------------------------
    // Timers and leaving
    // -----------------------------------------------------------------------

    pub fn shows_saved(&self, now: Instant) -> bool {
        self.saved_until.is_some_and(|until| now < until)
    }

    /// Advance timers. Returns true once when the post-create return is due.
    /// Further edits after a create cancel the pending return.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.saved_until.is_some_and(|until| now >= until) {
            self.saved_until = None;
        }
        if self.return_at.is_some() && self.is_dirty() {
            tracing::debug!("Edited after create, staying in the editor");
            self.return_at = None;
        }
        match self.return_at {
            Some(at) if now >= at => {
                self.return_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn request_leave(&self) -> LeaveDecision {
        if self.is_dirty() {
            LeaveDecision::ConfirmDiscard
        } else {
            LeaveDecision::Leave
        }
    }
}
