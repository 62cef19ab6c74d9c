// Flowboard — Home screen state: workflow table, playbook groups, row actions

use crate::api::{ApiError, WorkflowApi};
use crate::model::{Playbook, Workflow, WorkflowId};
use crate::nav::{EditRequest, HomeContext, Section};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Error updating workflow status: {0}")]
    Status(ApiError),
    #[error("Error deleting workflow: {0}")]
    Delete(ApiError),
}

/// A pending run/pause request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: WorkflowId,
    pub is_running: bool,
}

pub struct WorkflowList {
    workflows: Vec<Workflow>,
    loading: bool,
    section: Section,
    expanded: Option<Playbook>,
    /// Last row a run/pause was requested for; one tracked id per screen.
    updating_status: Option<WorkflowId>,
    deleting: Option<WorkflowId>,
}

impl WorkflowList {
    /// Start a list that reopens on the given tab and playbook group.
    /// The caller is expected to load it next.
    pub fn new(context: HomeContext) -> Self {
        Self {
            workflows: Vec::new(),
            loading: true,
            section: context.section,
            expanded: context.playbook,
            updating_status: None,
            deleting: None,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_reload(&mut self) {
        self.loading = true;
    }

    /// Apply the collection fetch. Failures are logged and leave the list as is.
    pub fn finish_load(&mut self, result: Result<Vec<Workflow>, ApiError>) {
        match result {
            Ok(workflows) => {
                tracing::debug!(count = workflows.len(), "Workflows loaded");
                self.workflows = workflows;
            }
            Err(e) => {
                tracing::error!("Error loading workflows: {}", e);
            }
        }
        self.loading = false;
    }

    pub async fn load(&mut self, api: &dyn WorkflowApi) {
        self.begin_reload();
        let result = api.list_workflows().await;
        self.finish_load(result);
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn find(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.workflows.iter().find(|w| &w.id == id)
    }

    pub fn plain_workflows(&self) -> Vec<&Workflow> {
        self.workflows
            .iter()
            .filter(|w| !w.is_playbook_workflow)
            .collect()
    }

    pub fn playbook_workflows(&self) -> Vec<&Workflow> {
        self.workflows
            .iter()
            .filter(|w| w.is_playbook_workflow)
            .collect()
    }

    pub fn playbooks_for(&self, playbook: Playbook) -> Vec<&Workflow> {
        self.workflows
            .iter()
            .filter(|w| w.is_playbook_workflow && w.playbook == Some(playbook))
            .collect()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    pub fn expanded_playbook(&self) -> Option<Playbook> {
        self.expanded
    }

    /// Accordion: opening a group closes the previous one, toggling the open
    /// group closes it.
    pub fn toggle_playbook(&mut self, playbook: Playbook) {
        self.expanded = if self.expanded == Some(playbook) {
            None
        } else {
            Some(playbook)
        };
    }

    // -----------------------------------------------------------------------
    // Run / pause
    // -----------------------------------------------------------------------

    pub fn is_updating_status(&self, id: &WorkflowId) -> bool {
        self.updating_status.as_ref() == Some(id)
    }

    /// Mark the row busy and return the request to send, or `None` when the
    /// row is unknown or its toggle is already in flight.
    pub fn begin_toggle(&mut self, id: &WorkflowId) -> Option<StatusChange> {
        if self.is_updating_status(id) {
            return None;
        }
        let workflow = self.find(id)?;
        let change = StatusChange {
            id: id.clone(),
            is_running: !workflow.is_running,
        };
        self.updating_status = Some(id.clone());
        Some(change)
    }

    pub fn finish_toggle(
        &mut self,
        change: &StatusChange,
        result: Result<(), ApiError>,
    ) -> Result<(), ListError> {
        self.updating_status = None;
        match result {
            Ok(()) => {
                if let Some(w) = self.workflows.iter_mut().find(|w| w.id == change.id) {
                    w.is_running = change.is_running;
                }
                tracing::info!(workflow = %change.id, running = change.is_running, "Workflow status updated");
                Ok(())
            }
            Err(e) => {
                tracing::error!(workflow = %change.id, "Status update error: {}", e);
                Err(ListError::Status(e))
            }
        }
    }

    pub async fn toggle_status(
        &mut self,
        api: &dyn WorkflowApi,
        id: &WorkflowId,
    ) -> Result<(), ListError> {
        let Some(change) = self.begin_toggle(id) else {
            return Ok(());
        };
        let result = api.set_running(&change.id, change.is_running).await;
        self.finish_toggle(&change, result)
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    pub fn is_deleting(&self, id: &WorkflowId) -> bool {
        self.deleting.as_ref() == Some(id)
    }

    /// Playbook workflows cannot be deleted from the list.
    pub fn can_delete(&self, id: &WorkflowId) -> bool {
        self.find(id).is_some_and(|w| !w.is_playbook_workflow) && !self.is_deleting(id)
    }

    /// Confirmation text shown before a delete is sent.
    pub fn delete_confirmation(&self, id: &WorkflowId) -> Option<String> {
        if !self.can_delete(id) {
            return None;
        }
        self.find(id).map(|w| {
            format!(
                "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                w.title
            )
        })
    }

    /// Call only after the user confirmed.
    pub fn begin_delete(&mut self, id: &WorkflowId) -> Option<WorkflowId> {
        if !self.can_delete(id) {
            return None;
        }
        self.deleting = Some(id.clone());
        Some(id.clone())
    }

    pub fn finish_delete(
        &mut self,
        id: &WorkflowId,
        result: Result<(), ApiError>,
    ) -> Result<(), ListError> {
        self.deleting = None;
        match result {
            Ok(()) => {
                self.workflows.retain(|w| &w.id != id);
                tracing::info!(workflow = %id, "Workflow deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(workflow = %id, "Delete error: {}", e);
                Err(ListError::Delete(e))
            }
        }
    }

    pub async fn delete(&mut self, api: &dyn WorkflowApi, id: &WorkflowId) -> Result<(), ListError> {
        let Some(id) = self.begin_delete(id) else {
            return Ok(());
        };
        let result = api.delete_workflow(&id).await;
        self.finish_delete(&id, result)
    }

    // -----------------------------------------------------------------------
    // Edit hand-off
    // -----------------------------------------------------------------------

    /// Build the navigation request for editing a row, remembering the tab
    /// and (for playbook rows) the group it was opened from.
    pub fn edit_request(&self, id: &WorkflowId) -> Option<EditRequest> {
        let workflow = self.find(id)?;
        let playbook = match self.section {
            Section::Playbooks if workflow.is_playbook_workflow => workflow.playbook,
            _ => None,
        };
        Some(EditRequest {
            id: id.clone(),
            from: HomeContext {
                section: self.section,
                playbook,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::model::{Step, StepId};

    fn workflow(id: &str, playbook: Option<Playbook>) -> Workflow {
        Workflow {
            id: WorkflowId::new(id),
            title: format!("Workflow {}", id),
            steps: vec![Step::new(StepId(1), "Do X")],
            is_running: false,
            is_playbook_workflow: playbook.is_some(),
            playbook,
            playbook_description: None,
        }
    }

    fn sample() -> Vec<Workflow> {
        vec![
            workflow("a", None),
            workflow("b", None),
            workflow("p1", Some(Playbook::FailingToClose)),
            workflow("p2", Some(Playbook::AcvOffWhack)),
        ]
    }

    async fn loaded(api: &FakeApi) -> WorkflowList {
        let mut list = WorkflowList::new(HomeContext::default());
        list.load(api).await;
        list
    }

    #[tokio::test]
    async fn test_partition_and_grouping() {
        let api = FakeApi::with(sample());
        let list = loaded(&api).await;
        assert!(!list.is_loading());
        assert_eq!(list.plain_workflows().len(), 2);
        assert_eq!(list.playbook_workflows().len(), 2);
        assert_eq!(list.playbooks_for(Playbook::FailingToClose).len(), 1);
        assert!(list.playbooks_for(Playbook::DealsDropOff).is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_leaves_list_empty() {
        let api = FakeApi::with(sample());
        api.fail("boom");
        let list = loaded(&api).await;
        assert!(!list.is_loading());
        assert!(list.workflows().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_flips_only_target() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        list.toggle_status(&api, &WorkflowId::new("b")).await.unwrap();
        assert!(list.find(&WorkflowId::new("b")).unwrap().is_running);
        assert!(!list.find(&WorkflowId::new("a")).unwrap().is_running);
        assert!(api.calls().contains(&"PATCH /api/workflows/b/status true".to_string()));
    }

    #[tokio::test]
    async fn test_toggle_failure_keeps_state() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        api.fail("backend down");
        let err = list
            .toggle_status(&api, &WorkflowId::new("a"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error updating workflow status: backend down");
        assert!(!list.find(&WorkflowId::new("a")).unwrap().is_running);
        assert!(!list.is_updating_status(&WorkflowId::new("a")));
    }

    #[tokio::test]
    async fn test_toggle_in_flight_is_disabled_per_tracked_row() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        let a = WorkflowId::new("a");
        let b = WorkflowId::new("b");

        let first = list.begin_toggle(&a).unwrap();
        assert!(list.begin_toggle(&a).is_none());

        // Another row may start and takes over the tracked id.
        let second = list.begin_toggle(&b).unwrap();
        assert!(list.is_updating_status(&b));
        assert!(!list.is_updating_status(&a));

        list.finish_toggle(&first, Ok(())).unwrap();
        list.finish_toggle(&second, Ok(())).unwrap();
        assert!(list.find(&a).unwrap().is_running);
        assert!(list.find(&b).unwrap().is_running);
    }

    #[tokio::test]
    async fn test_delete_success_and_failure() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        let a = WorkflowId::new("a");

        api.fail("locked");
        let err = list.delete(&api, &a).await.unwrap_err();
        assert_eq!(err.to_string(), "Error deleting workflow: locked");
        assert_eq!(list.workflows().len(), 4);

        *api.fail_with.lock().unwrap() = None;
        list.delete(&api, &a).await.unwrap();
        assert!(list.find(&a).is_none());
        assert_eq!(list.workflows().len(), 3);
    }

    #[tokio::test]
    async fn test_playbook_rows_are_not_deletable() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        let p1 = WorkflowId::new("p1");
        assert!(list.delete_confirmation(&p1).is_none());
        list.delete(&api, &p1).await.unwrap();
        assert!(list.find(&p1).is_some());
        assert!(!api.calls().iter().any(|c| c.starts_with("DELETE")));
    }

    #[tokio::test]
    async fn test_delete_confirmation_text() {
        let api = FakeApi::with(sample());
        let list = loaded(&api).await;
        assert_eq!(
            list.delete_confirmation(&WorkflowId::new("a")).unwrap(),
            "Are you sure you want to delete \"Workflow a\"? This action cannot be undone."
        );
    }

    #[test]
    fn test_accordion_single_open() {
        let mut list = WorkflowList::new(HomeContext {
            section: Section::Playbooks,
            playbook: Some(Playbook::DealsDropOff),
        });
        assert_eq!(list.expanded_playbook(), Some(Playbook::DealsDropOff));
        list.toggle_playbook(Playbook::AcvOffWhack);
        assert_eq!(list.expanded_playbook(), Some(Playbook::AcvOffWhack));
        list.toggle_playbook(Playbook::AcvOffWhack);
        assert_eq!(list.expanded_playbook(), None);
    }

    #[tokio::test]
    async fn test_edit_request_carries_context() {
        let api = FakeApi::with(sample());
        let mut list = loaded(&api).await;
        let plain = list.edit_request(&WorkflowId::new("a")).unwrap();
        assert_eq!(plain.from, HomeContext::default());

        list.set_section(Section::Playbooks);
        list.toggle_playbook(Playbook::AcvOffWhack);
        let pb = list.edit_request(&WorkflowId::new("p2")).unwrap();
        assert_eq!(pb.from.section, Section::Playbooks);
        assert_eq!(pb.from.playbook, Some(Playbook::AcvOffWhack));
    }
}
