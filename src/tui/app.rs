// Flowboard — TUI application state and background request plumbing.

use super::activity::ActivityLog;
use crate::api::{ApiError, WorkflowApi};
use crate::config::Config;
use crate::editor::{
    EditorError, EditorTimings, LeaveDecision, LoadOutcome, SaveRequest, StepField, WorkflowEditor,
};
use crate::list::{StatusChange, WorkflowList};
use crate::model::{Executor, Playbook, StepId, Workflow, WorkflowId, PLAYBOOK_SECTIONS};
use crate::nav::{NavigationShell, Section, View};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Results of requests running on background tasks.
#[derive(Debug)]
pub enum AppEvent {
    WorkflowsLoaded(Result<Vec<Workflow>, ApiError>),
    WorkflowLoaded {
        session: u64,
        id: WorkflowId,
        result: Result<Option<Workflow>, ApiError>,
    },
    StatusToggled {
        change: StatusChange,
        result: Result<(), ApiError>,
    },
    Deleted {
        id: WorkflowId,
        result: Result<(), ApiError>,
    },
    Saved {
        session: u64,
        request: SaveRequest,
        result: Result<Option<WorkflowId>, ApiError>,
    },
}

/// What happens when the user confirms leaving a dirty editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveAction {
    Back,
    Quit,
}

/// Modal dialogs. While one is open no other key reaches the screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Alert(String),
    ConfirmDelete { id: WorkflowId, message: String },
    UnsavedChanges { then: LeaveAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Title,
    Step(StepId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Inline text editing; every keystroke updates the draft.
    Editing(EditTarget),
}

/// One selectable line of the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeRow {
    Header(Playbook),
    Workflow(WorkflowId),
}

pub struct App {
    api: Arc<dyn WorkflowApi>,
    events: mpsc::UnboundedSender<AppEvent>,
    timings: EditorTimings,
    pub nav: NavigationShell,
    pub list: WorkflowList,
    pub editor: Option<WorkflowEditor>,
    pub prompt: Option<Prompt>,
    pub mode: Mode,
    pub home_cursor: usize,
    /// 0 is the title, `n + 1` is step `n`.
    pub editor_cursor: usize,
    pub notice: Option<String>,
    pub activity: ActivityLog,
    /// Bumped every time an editor opens; results for older editors are dropped.
    editor_session: u64,
    focus_after_load: Option<WorkflowId>,
    should_quit: bool,
}

impl App {
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        config: &Config,
        activity: ActivityLog,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let nav = NavigationShell::new();
        let app = Self {
            api,
            events: tx,
            timings: config.ui.editor_timings(),
            list: WorkflowList::new(nav.home_context()),
            nav,
            editor: None,
            prompt: None,
            mode: Mode::Browse,
            home_cursor: 0,
            editor_cursor: 0,
            notice: None,
            activity,
            editor_session: 0,
            focus_after_load: None,
            should_quit: false,
        };
        (app, rx)
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.events.clone();
        tokio::spawn(async move {
            // Receiver only goes away when the UI has exited.
            let _ = tx.send(request.await);
        });
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        self.prompt = Some(Prompt::Alert(message.into()));
    }

    pub fn dismiss_prompt(&mut self) {
        self.prompt = None;
    }

    // -----------------------------------------------------------------------
    // Home screen
    // -----------------------------------------------------------------------

    pub fn reload_workflows(&mut self) {
        self.list.begin_reload();
        let api = self.api.clone();
        self.spawn(async move { AppEvent::WorkflowsLoaded(api.list_workflows().await) });
    }

    pub fn home_rows(&self) -> Vec<HomeRow> {
        match self.list.section() {
            Section::Workflows => self
                .list
                .plain_workflows()
                .into_iter()
                .map(|w| HomeRow::Workflow(w.id.clone()))
                .collect(),
            Section::Playbooks => {
                let mut rows = Vec::new();
                for section in &PLAYBOOK_SECTIONS {
                    rows.push(HomeRow::Header(section.id));
                    if self.list.expanded_playbook() == Some(section.id) {
                        rows.extend(
                            self.list
                                .playbooks_for(section.id)
                                .into_iter()
                                .map(|w| HomeRow::Workflow(w.id.clone())),
                        );
                    }
                }
                rows
            }
        }
    }

    pub fn selected_home_row(&self) -> Option<HomeRow> {
        self.home_rows().into_iter().nth(self.home_cursor)
    }

    fn selected_workflow_id(&self) -> Option<WorkflowId> {
        match self.selected_home_row()? {
            HomeRow::Workflow(id) => Some(id),
            HomeRow::Header(_) => None,
        }
    }

    pub fn move_home_cursor(&mut self, delta: isize) {
        let len = self.home_rows().len();
        self.home_cursor = step_cursor(self.home_cursor, delta, len);
    }

    pub fn switch_section(&mut self) {
        self.list.set_section(self.list.section().toggled());
        self.home_cursor = 0;
    }

    /// Enter on the home screen: toggle an accordion header or edit a row.
    pub fn activate_home_row(&mut self) {
        match self.selected_home_row() {
            Some(HomeRow::Header(pb)) => {
                self.list.toggle_playbook(pb);
                self.home_cursor = self
                    .home_rows()
                    .iter()
                    .position(|r| r == &HomeRow::Header(pb))
                    .unwrap_or(0);
            }
            Some(HomeRow::Workflow(_)) => self.edit_selected(),
            None => {}
        }
    }

    pub fn edit_selected(&mut self) {
        let Some(id) = self.selected_workflow_id() else {
            return;
        };
        if let Some(request) = self.list.edit_request(&id) {
            self.nav.navigate_to_workflow(request);
            self.open_editor(Some(id));
        }
    }

    pub fn create_new(&mut self) {
        if self.list.section() != Section::Workflows {
            return;
        }
        self.nav.create_new();
        self.open_editor(None);
    }

    pub fn toggle_selected_status(&mut self) {
        let Some(id) = self.selected_workflow_id() else {
            return;
        };
        let Some(change) = self.list.begin_toggle(&id) else {
            return;
        };
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.set_running(&change.id, change.is_running).await;
            AppEvent::StatusToggled { change, result }
        });
    }

    pub fn request_delete_selected(&mut self) {
        let Some(id) = self.selected_workflow_id() else {
            return;
        };
        if let Some(message) = self.list.delete_confirmation(&id) {
            self.prompt = Some(Prompt::ConfirmDelete { id, message });
        }
    }

    pub fn confirm_delete(&mut self) {
        let Some(Prompt::ConfirmDelete { id, .. }) = self.prompt.take() else {
            return;
        };
        let Some(id) = self.list.begin_delete(&id) else {
            return;
        };
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.delete_workflow(&id).await;
            AppEvent::Deleted { id, result }
        });
    }

    // -----------------------------------------------------------------------
    // Editor
    // -----------------------------------------------------------------------

    fn open_editor(&mut self, id: Option<WorkflowId>) {
        self.editor_session += 1;
        self.focus_after_load = id.clone();
        self.editor = Some(WorkflowEditor::new(id.clone(), self.timings));
        self.editor_cursor = 0;
        self.mode = Mode::Browse;
        self.notice = None;

        if let Some(id) = id {
            let api = self.api.clone();
            let session = self.editor_session;
            self.spawn(async move {
                let result = api.get_workflow(&id).await;
                AppEvent::WorkflowLoaded {
                    session,
                    id,
                    result,
                }
            });
        }
    }

    fn ready_editor(&mut self) -> Option<&mut WorkflowEditor> {
        self.editor.as_mut().filter(|e| !e.is_loading())
    }

    fn selected_step(&self) -> Option<(usize, StepId)> {
        let editor = self.editor.as_ref()?;
        let index = self.editor_cursor.checked_sub(1)?;
        editor.steps().get(index).map(|s| (index, s.id))
    }

    pub fn move_editor_cursor(&mut self, delta: isize) {
        let rows = self.editor.as_ref().map_or(1, |e| e.steps().len() + 1);
        self.editor_cursor = step_cursor(self.editor_cursor, delta, rows);
    }

    pub fn add_step(&mut self) {
        let Some(editor) = self.ready_editor() else {
            return;
        };
        let id = editor.add_step();
        let last = editor.steps().len();
        self.editor_cursor = last;
        self.mode = Mode::Editing(EditTarget::Step(id));
    }

    pub fn delete_selected_step(&mut self) {
        let Some((_, id)) = self.selected_step() else {
            return;
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        if editor.delete_step(id) {
            let last = editor.steps().len();
            self.editor_cursor = self.editor_cursor.min(last);
        }
    }

    pub fn move_selected_step(&mut self, up: bool) {
        let Some((index, _)) = self.selected_step() else {
            return;
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        let moved = if up {
            editor.move_step_up(index)
        } else {
            editor.move_step_down(index)
        };
        if moved {
            self.editor_cursor = if up {
                self.editor_cursor - 1
            } else {
                self.editor_cursor + 1
            };
        }
    }

    pub fn toggle_selected_executor(&mut self) {
        let Some((index, id)) = self.selected_step() else {
            return;
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        let next = match editor.steps()[index].executor() {
            Executor::Ai => Executor::Human,
            Executor::Human => Executor::Ai,
        };
        editor.update_step(id, StepField::Executor(next));
    }

    pub fn cycle_selected_human(&mut self) {
        let Some((index, id)) = self.selected_step() else {
            return;
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        if let Some(human) = editor.steps()[index].assignee.human() {
            editor.update_step(id, StepField::AssignedHuman(human.next()));
        }
    }

    pub fn begin_text_edit(&mut self) {
        let target = match self.selected_step() {
            Some((_, id)) => EditTarget::Step(id),
            None => EditTarget::Title,
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        if target == EditTarget::Title && editor.is_playbook_workflow() {
            self.notice = Some("Playbook titles are read-only".to_string());
            return;
        }
        self.mode = Mode::Editing(target);
    }

    pub fn finish_text_edit(&mut self) {
        self.mode = Mode::Browse;
    }

    fn edit_text(&mut self, apply: impl FnOnce(&mut String)) {
        let Mode::Editing(target) = self.mode else {
            return;
        };
        let Some(editor) = self.ready_editor() else {
            return;
        };
        match target {
            EditTarget::Title => {
                let mut title = editor.title().to_string();
                apply(&mut title);
                editor.set_title(title);
            }
            EditTarget::Step(id) => {
                let Some(step) = editor.steps().iter().find(|s| s.id == id) else {
                    return;
                };
                let mut text = step.instruction.clone();
                apply(&mut text);
                editor.update_step(id, StepField::Instruction(text));
            }
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_text(|s| s.push(c));
    }

    pub fn delete_char(&mut self) {
        self.edit_text(|s| {
            s.pop();
        });
    }

    pub fn save(&mut self) {
        self.mode = Mode::Browse;
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let request = match editor.begin_save() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Save rejected: {}", e);
                self.alert(e.to_string());
                return;
            }
        };
        let api = self.api.clone();
        let session = self.editor_session;
        self.spawn(async move {
            let result = request.send(api.as_ref()).await;
            AppEvent::Saved {
                session,
                request,
                result,
            }
        });
    }

    /// Back from the editor, asking first when there are unsaved edits.
    pub fn request_back(&mut self) {
        self.mode = Mode::Browse;
        match self.editor.as_ref().map(|e| e.request_leave()) {
            Some(LeaveDecision::ConfirmDiscard) => {
                self.prompt = Some(Prompt::UnsavedChanges {
                    then: LeaveAction::Back,
                });
            }
            _ => self.go_home(),
        }
    }

    pub fn request_quit(&mut self) {
        match self.editor.as_ref().map(|e| e.request_leave()) {
            Some(LeaveDecision::ConfirmDiscard) => {
                self.mode = Mode::Browse;
                self.prompt = Some(Prompt::UnsavedChanges {
                    then: LeaveAction::Quit,
                });
            }
            _ => self.should_quit = true,
        }
    }

    /// Answer the unsaved-changes prompt.
    pub fn resolve_unsaved(&mut self, leave: bool) {
        let Some(Prompt::UnsavedChanges { then }) = self.prompt.take() else {
            return;
        };
        if !leave {
            return;
        }
        match then {
            LeaveAction::Back => self.go_home(),
            LeaveAction::Quit => self.should_quit = true,
        }
    }

    /// Drop the editor and rebuild the list in the remembered context.
    fn go_home(&mut self) {
        self.nav.navigate_back();
        self.editor = None;
        self.mode = Mode::Browse;
        self.notice = None;
        if matches!(self.prompt, Some(Prompt::UnsavedChanges { .. })) {
            self.prompt = None;
        }
        self.list = WorkflowList::new(self.nav.home_context());
        self.home_cursor = 0;
        self.reload_workflows();
    }

    // -----------------------------------------------------------------------
    // Events and timers
    // -----------------------------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::WorkflowsLoaded(result) => {
                self.list.finish_load(result);
                self.restore_home_cursor();
            }
            AppEvent::WorkflowLoaded {
                session,
                id,
                result,
            } => {
                if session != self.editor_session {
                    tracing::debug!(workflow = %id, "Ignoring load for a closed editor");
                    return;
                }
                let Some(editor) = self.editor.as_mut() else {
                    return;
                };
                if editor.initial_id() != Some(&id) || !editor.is_loading() {
                    tracing::debug!(workflow = %id, "Ignoring stale workflow load");
                    return;
                }
                editor.finish_load(result);
                self.notice = match editor.load_outcome() {
                    LoadOutcome::NotFound => {
                        Some(format!("Workflow {} not found, started a new one", id))
                    }
                    LoadOutcome::Failed(e) => {
                        Some(format!("Could not load workflow {}: {}", id, e))
                    }
                    _ => None,
                };
            }
            AppEvent::StatusToggled { change, result } => {
                if let Err(e) = self.list.finish_toggle(&change, result) {
                    self.alert(e.to_string());
                }
            }
            AppEvent::Deleted { id, result } => {
                match self.list.finish_delete(&id, result) {
                    Ok(()) => {
                        let len = self.home_rows().len();
                        self.home_cursor = self.home_cursor.min(len.saturating_sub(1));
                    }
                    Err(e) => self.alert(e.to_string()),
                }
            }
            AppEvent::Saved {
                session,
                request,
                result,
            } => {
                if session != self.editor_session || self.editor.is_none() {
                    self.finish_detached_save(request, result);
                    return;
                }
                let Some(editor) = self.editor.as_mut() else {
                    return;
                };
                match editor.finish_save(request, result, Instant::now()) {
                    Ok(outcome) => {
                        if let Some(id) = outcome.created {
                            self.focus_after_load = Some(id);
                        }
                    }
                    Err(e) => self.alert(e.to_string()),
                }
            }
        }
    }

    /// A save whose editor has since been closed. Nothing in the current
    /// screen is touched; the list is refreshed if it is showing.
    fn finish_detached_save(
        &mut self,
        request: SaveRequest,
        result: Result<Option<WorkflowId>, ApiError>,
    ) {
        match result {
            Ok(created) => {
                let id = created.or(request.target);
                tracing::info!(workflow = ?id, "Save finished after leaving the editor");
                if self.nav.view() == View::Home {
                    self.reload_workflows();
                }
            }
            Err(e) => {
                tracing::error!(workflow = ?request.target, "Save error: {}", e);
                self.alert(EditorError::Save(e).to_string());
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let due = self.editor.as_mut().is_some_and(|e| e.tick(now));
        if due && self.nav.view() == View::Workflow {
            self.go_home();
        }
    }

    /// Put the cursor back on the workflow that was last opened.
    fn restore_home_cursor(&mut self) {
        let rows = self.home_rows();
        self.home_cursor = match self.focus_after_load.take() {
            Some(id) => rows
                .iter()
                .position(|r| r == &HomeRow::Workflow(id.clone()))
                .unwrap_or(0),
            None => self.home_cursor.min(rows.len().saturating_sub(1)),
        };
    }
}

fn step_cursor(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}
