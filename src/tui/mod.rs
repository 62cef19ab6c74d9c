pub mod activity;
pub mod app;
pub mod input;
pub mod ui;

use crate::api::WorkflowApi;
use crate::config::Config;
use crate::tui::activity::ActivityLog;
use crate::tui::app::App;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Instant;

/// Run the workflow manager in the current terminal.
/// This takes over the terminal and blocks until the user quits.
pub async fn run(api: Arc<dyn WorkflowApi>, cfg: Config, activity: ActivityLog) -> anyhow::Result<()> {
    let (mut app, mut events) = App::new(api, &cfg, activity);
    tracing::info!("Connected to {}", cfg.api.base_url);
    app.reload_workflows();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = cfg.ui.tick_rate();
    let result: anyhow::Result<()> = loop {
        // Apply finished background requests before drawing.
        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }
        app.on_tick(Instant::now());

        if let Err(e) = terminal.draw(|frame| ui::render(frame, &app)) {
            break Err(e.into());
        }

        // Poll with a short timeout so request results and timers show up promptly.
        match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    input::handle_key(key, &mut app)
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if app.should_quit() {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}
