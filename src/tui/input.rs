// Flowboard — Keyboard handling, one handler per screen and mode.

use super::app::{App, Mode, Prompt};
use crate::nav::{Section, View};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Route a key press to whatever currently has focus.
pub fn handle_key(key: KeyEvent, app: &mut App) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.request_quit();
        return;
    }

    match app.prompt {
        Some(Prompt::Alert(_)) => return handle_alert(key, app),
        Some(Prompt::ConfirmDelete { .. }) => return handle_confirm_delete(key, app),
        Some(Prompt::UnsavedChanges { .. }) => return handle_unsaved_changes(key, app),
        None => {}
    }

    match (app.nav.view(), app.mode) {
        (View::Home, _) => handle_home(key, app),
        (View::Workflow, Mode::Browse) => handle_editor(key, app),
        (View::Workflow, Mode::Editing(_)) => handle_text_input(key, app),
    }
}

fn handle_alert(key: KeyEvent, app: &mut App) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
        app.dismiss_prompt();
    }
}

fn handle_confirm_delete(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => app.dismiss_prompt(),
        _ => {}
    }
}

fn handle_unsaved_changes(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('l' | 'L') => app.resolve_unsaved(true),
        // Cancel is the default so a stray Enter never throws work away.
        KeyCode::Char('c' | 'C') | KeyCode::Esc | KeyCode::Enter => app.resolve_unsaved(false),
        _ => {}
    }
}

fn handle_home(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('q') => app.request_quit(),
        KeyCode::Tab | KeyCode::BackTab => app.switch_section(),
        KeyCode::Up | KeyCode::Char('k') => app.move_home_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_home_cursor(1),
        KeyCode::Enter => app.activate_home_row(),
        KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('r') => app.toggle_selected_status(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_selected(),
        KeyCode::Char('n') if app.list.section() == Section::Workflows => app.create_new(),
        KeyCode::F(5) => app.reload_workflows(),
        _ => {}
    }
}

fn handle_editor(key: KeyEvent, app: &mut App) {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        // Plain or with Ctrl.
        KeyCode::Char('s') => app.save(),
        KeyCode::Esc | KeyCode::Char('b') => app.request_back(),
        KeyCode::Char('q') => app.request_quit(),
        KeyCode::Up if shift => app.move_selected_step(true),
        KeyCode::Down if shift => app.move_selected_step(false),
        KeyCode::Char('K') => app.move_selected_step(true),
        KeyCode::Char('J') => app.move_selected_step(false),
        KeyCode::Up | KeyCode::Char('k') => app.move_editor_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_editor_cursor(1),
        KeyCode::Enter => app.begin_text_edit(),
        KeyCode::Char('a') => app.add_step(),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected_step(),
        KeyCode::Char(' ') => app.toggle_selected_executor(),
        KeyCode::Char('h') => app.cycle_selected_human(),
        _ => {}
    }
}

fn handle_text_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.save(),
        KeyCode::Enter | KeyCode::Esc => app.finish_text_edit(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::config::Config;
    use crate::tui::activity::ActivityLog;
    use std::sync::Arc;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), app);
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_typing_goes_to_the_field_not_the_shortcuts() {
        let (mut app, _rx) = App::new(
            Arc::new(FakeApi::default()),
            &Config::default(),
            ActivityLog::new(),
        );
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.nav.view(), View::Workflow);

        // New step opens in edit mode; 'x' and 's' must be typed, not acted on.
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Send sx");
        press(&mut app, KeyCode::Enter);

        let editor = app.editor.as_ref().unwrap();
        assert_eq!(editor.steps().len(), 2);
        assert_eq!(editor.steps()[1].instruction, "Send sx");
        assert!(!editor.is_saving());
    }

    #[tokio::test]
    async fn test_new_is_ignored_on_playbooks_tab() {
        let (mut app, _rx) = App::new(
            Arc::new(FakeApi::default()),
            &Config::default(),
            ActivityLog::new(),
        );
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.nav.view(), View::Home);
    }

    #[tokio::test]
    async fn test_prompt_swallows_keys() {
        let (mut app, _rx) = App::new(
            Arc::new(FakeApi::default()),
            &Config::default(),
            ActivityLog::new(),
        );
        app.alert("Error saving workflow: boom");
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Enter);
        assert!(app.prompt.is_none());
    }

    #[tokio::test]
    async fn test_shift_arrows_reorder_steps() {
        let (mut app, _rx) = App::new(
            Arc::new(FakeApi::default()),
            &Config::default(),
            ActivityLog::new(),
        );
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "second");
        press(&mut app, KeyCode::Esc);

        handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::SHIFT), &mut app);
        let editor = app.editor.as_ref().unwrap();
        assert_eq!(editor.steps()[0].instruction, "second");
        assert_eq!(app.editor_cursor, 1);
    }
}
