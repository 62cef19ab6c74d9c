// Flowboard — Top-level navigation between the home screen and the editor

use crate::model::{Playbook, WorkflowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Workflow,
}

/// Tabs of the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Workflows,
    Playbooks,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Workflows => "Workflows",
            Section::Playbooks => "Playbooks",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Section::Workflows => Section::Playbooks,
            Section::Playbooks => Section::Workflows,
        }
    }
}

/// Where the home screen should reopen: tab plus expanded playbook group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HomeContext {
    pub section: Section,
    pub playbook: Option<Playbook>,
}

/// Request to open a workflow, carrying the context to come back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub id: WorkflowId,
    pub from: HomeContext,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationShell {
    view: View,
    selected: Option<WorkflowId>,
    previous: HomeContext,
}

impl NavigationShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Workflow being edited; `None` in the editor means "create new".
    pub fn selected_workflow(&self) -> Option<&WorkflowId> {
        self.selected.as_ref()
    }

    pub fn home_context(&self) -> HomeContext {
        self.previous
    }

    pub fn navigate_to_workflow(&mut self, request: EditRequest) {
        tracing::debug!(workflow = %request.id, "Opening workflow editor");
        self.selected = Some(request.id);
        self.previous = request.from;
        self.view = View::Workflow;
    }

    pub fn create_new(&mut self) {
        tracing::debug!("Opening editor for a new workflow");
        self.selected = None;
        self.previous = HomeContext::default();
        self.view = View::Workflow;
    }

    /// Back to the home screen. The remembered context is kept so the list
    /// reopens on the same tab and playbook group.
    pub fn navigate_back(&mut self) {
        self.view = View::Home;
        self.selected = None;
    }
}
