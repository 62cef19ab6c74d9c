// Flowboard — TUI rendering (ratatui widgets and layout).

use super::activity::{LogEntry, LogLevel};
use super::app::{App, EditTarget, HomeRow, LeaveAction, Mode, Prompt};
use crate::editor::WorkflowEditor;
use crate::model::{step_summary, Assignee, Playbook, Workflow};
use crate::nav::{Section, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

const HEADER_ART: &str = " Flowboard ";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render the whole screen for the current view.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main vertical split: header (3) | body | activity (6) | footer (3)
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, outer[0], app);
    match (app.nav.view(), app.editor.as_ref()) {
        (View::Workflow, Some(editor)) => render_editor(frame, outer[1], app, editor),
        _ => render_home(frame, outer[1], app),
    }
    render_activity(frame, outer[2], &app.activity.recent(4));
    render_footer(frame, outer[3], app);

    if let Some(prompt) = &app.prompt {
        render_prompt(frame, area, prompt);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "◆ ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            HEADER_ART,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("v{}  ", VERSION), Style::default().fg(Color::DarkGray)),
    ];

    if app.nav.view() == View::Home {
        let counts = [
            (Section::Workflows, app.list.plain_workflows().len()),
            (Section::Playbooks, app.list.playbook_workflows().len()),
        ];
        for (section, count) in counts {
            let style = if app.list.section() == section {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ({}) ", section.title(), count), style));
            spans.push(Span::raw(" "));
        }
    }

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(title, area);
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn render_home(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!(" ◉ {} ", app.list.section().title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    if app.list.is_loading() && app.list.workflows().is_empty() {
        let widget = Paragraph::new("  Loading workflows...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(widget, area);
        return;
    }

    let empty = match app.list.section() {
        Section::Workflows if app.list.plain_workflows().is_empty() => {
            Some("  No workflows yet. Press n to create one.")
        }
        _ => None,
    };
    if let Some(text) = empty {
        let widget = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(widget, area);
        return;
    }

    let items: Vec<ListItem> = app
        .home_rows()
        .iter()
        .filter_map(|row| match row {
            HomeRow::Header(pb) => Some(playbook_header_item(app, *pb)),
            HomeRow::Workflow(id) => app
                .list
                .find(id)
                .map(|w| workflow_item(app, w, app.list.section() == Section::Playbooks)),
        })
        .collect();

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let list_area = if app.list.section() == Section::Playbooks
        && app.list.playbook_workflows().is_empty()
    {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);
        let hint = Paragraph::new("  No playbooks yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, parts[0]);
        parts[1]
    } else {
        inner
    };

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(Some(app.home_cursor));
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn playbook_header_item<'a>(app: &App, playbook: Playbook) -> ListItem<'a> {
    let section = playbook.section();
    let count = app.list.playbooks_for(playbook).len();
    let expanded = app.list.expanded_playbook() == Some(playbook);
    let noun = if count == 1 { "workflow" } else { "workflows" };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            if expanded { "▾ " } else { "▸ " },
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{} ", section.icon), Style::default().fg(Color::Yellow)),
        Span::styled(
            section.title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} {}", count, noun),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    if expanded {
        lines.push(Line::from(Span::styled(
            format!("    {}", section.description),
            Style::default().fg(Color::Gray),
        )));
        if count == 0 {
            lines.push(Line::from(Span::styled(
                "    No workflows in this playbook yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    ListItem::new(lines)
}

fn workflow_item<'a>(app: &App, workflow: &Workflow, indented: bool) -> ListItem<'a> {
    let indent = if indented { "    " } else { "" };
    let (dot, badge, color) = if workflow.is_running {
        ("●", "Active", Color::Green)
    } else {
        ("○", "Paused", Color::DarkGray)
    };

    let mut first = vec![
        Span::raw(indent.to_string()),
        Span::styled(format!("{} ", dot), Style::default().fg(color)),
        Span::styled(
            workflow.title.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  [{}]", badge), Style::default().fg(color)),
        Span::styled(
            format!("  {}", step_summary(&workflow.steps)),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if app.list.is_updating_status(&workflow.id) {
        first.push(Span::styled("  Updating...", Style::default().fg(Color::Yellow)));
    }
    if app.list.is_deleting(&workflow.id) {
        first.push(Span::styled("  Deleting...", Style::default().fg(Color::Red)));
    }

    let mut lines = vec![Line::from(first)];
    if let Some(preview) = workflow.preview().filter(|p| !p.is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("{}    {}", indent, preview),
            Style::default().fg(Color::Gray),
        )));
    }
    ListItem::new(lines)
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

fn render_editor(frame: &mut Frame, area: Rect, app: &App, editor: &WorkflowEditor) {
    let block = Block::default()
        .title(format!(" ◉ {} ", editor.heading()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    if editor.is_loading() {
        let widget = Paragraph::new("  Loading workflow...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(widget, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let description = editor.playbook_description().filter(|d| !d.is_empty());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(if description.is_some() { 3 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    render_title_field(frame, rows[0], app, editor);
    if let Some(text) = description {
        let widget = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .block(Block::default().title(" Playbook ").borders(Borders::TOP));
        frame.render_widget(widget, rows[1]);
    }
    render_steps(frame, rows[2], app, editor);
    render_save_status(frame, rows[3], app, editor);
}

fn render_title_field(frame: &mut Frame, area: Rect, app: &App, editor: &WorkflowEditor) {
    let editing = app.mode == Mode::Editing(EditTarget::Title);
    let selected = app.editor_cursor == 0;
    let mut text = editor.title().to_string();
    if editing {
        text.push('▏');
    }
    let border = if editing {
        Color::Cyan
    } else if selected {
        Color::White
    } else {
        Color::DarkGray
    };
    let label = if editor.is_playbook_workflow() {
        " Title (read-only) "
    } else {
        " Title "
    };
    let widget = Paragraph::new(text).block(
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(widget, area);
}

fn render_steps(frame: &mut Frame, area: Rect, app: &App, editor: &WorkflowEditor) {
    let single = editor.steps().len() == 1;
    let items: Vec<ListItem> = editor
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let editing = app.mode == Mode::Editing(EditTarget::Step(step.id));
            let (who, color) = match step.assignee {
                Assignee::Ai => ("AI".to_string(), Color::Magenta),
                Assignee::Human(h) => (format!("Human: {}", h), Color::Blue),
            };
            let mut instruction = step.instruction.clone();
            if editing {
                instruction.push('▏');
            } else if instruction.is_empty() {
                instruction = "(empty instruction)".to_string();
            }
            let mut header = vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("[{}]", who), Style::default().fg(color)),
            ];
            if !single {
                header.push(Span::styled("  K/J move  x delete", Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(vec![
                Line::from(header),
                Line::from(Span::styled(
                    format!("    {}", instruction),
                    Style::default().fg(if editing { Color::Cyan } else { Color::White }),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Steps ").borders(Borders::TOP))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");
    let selected = app.editor_cursor.checked_sub(1);
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_save_status(frame: &mut Frame, area: Rect, app: &App, editor: &WorkflowEditor) {
    let mut spans = Vec::new();
    if editor.is_saving() {
        spans.push(Span::styled(" Saving... ", Style::default().fg(Color::Yellow)));
    } else if editor.shows_saved(Instant::now()) {
        spans.push(Span::styled(" ✔ Saved ", Style::default().fg(Color::Green)));
    } else if editor.is_dirty() {
        spans.push(Span::styled(" ● Unsaved changes ", Style::default().fg(Color::Yellow)));
    }
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(format!(" {} ", notice), Style::default().fg(Color::Red)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Activity and footer
// ---------------------------------------------------------------------------

fn render_activity(frame: &mut Frame, area: Rect, logs: &[LogEntry]) {
    let items: Vec<ListItem> = logs
        .iter()
        .rev()
        .take((area.height as usize).saturating_sub(2))
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::White,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Error => Color::Red,
                LogLevel::Debug => Color::DarkGray,
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} ", entry.level.symbol()),
                    Style::default().fg(color),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let widget = List::new(items).block(
        Block::default()
            .title(" ◉ Activity ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(widget, area);
}

fn key_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    match (app.nav.view(), app.mode) {
        (View::Workflow, Mode::Editing(_)) => &[("Enter/Esc", "Done"), ("Ctrl+S", "Save")],
        (View::Workflow, Mode::Browse) => &[
            ("↑↓", "Select"),
            ("Enter", "Edit"),
            ("a", "Add step"),
            ("Space", "AI/Human"),
            ("h", "Human"),
            ("s", "Save"),
            ("Esc", "Back"),
        ],
        (View::Home, _) if app.list.section() == Section::Workflows => &[
            ("Tab", "Playbooks"),
            ("Enter", "Edit"),
            ("r", "Run/Pause"),
            ("d", "Delete"),
            ("n", "New"),
            ("F5", "Reload"),
            ("q", "Quit"),
        ],
        (View::Home, _) => &[
            ("Tab", "Workflows"),
            ("Enter", "Open"),
            ("r", "Run/Pause"),
            ("F5", "Reload"),
            ("q", "Quit"),
        ],
    }
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let spans: Vec<Span> = key_hints(app)
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(
                    format!(" {} ", key),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ),
                Span::styled(format!(" {}  ", label), Style::default().fg(Color::Gray)),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(footer, area);
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let (title, message, hint, color) = match prompt {
        Prompt::Alert(message) => (" Error ", message.clone(), "Enter OK", Color::Red),
        Prompt::ConfirmDelete { message, .. } => {
            (" Delete Workflow ", message.clone(), "y Delete   n Cancel", Color::Red)
        }
        Prompt::UnsavedChanges { then } => {
            let action = match then {
                LeaveAction::Back => "leave",
                LeaveAction::Quit => "quit",
            };
            (
                " Unsaved Changes ",
                format!(
                    "You have unsaved changes. Are you sure you want to {} without saving?",
                    action
                ),
                "l Leave without saving   c Cancel",
                Color::Yellow,
            )
        }
    };

    // Center the popup
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7;
    let popup_area = Rect::new(
        (area.width.saturating_sub(popup_width)) / 2,
        (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);
    let content = vec![
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ];
    let popup = Paragraph::new(content).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(popup, popup_area);
}
