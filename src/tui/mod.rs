// terminal chat client for the property api

mod app;
mod event;
mod theme;
mod ui;

pub use app::App;
pub use theme::ThemeKind;

use crossterm::{
    cursor::SetCursorStyle,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::time::Duration;

use crate::Error;
use crate::api::QueryRequest;
use crate::client::Backend;
use app::{LogLevel, Status};
use event::{Action, handle_event, poll_event};

pub async fn run(server: &str, session: &str) -> Result<(), Error> {
    let backend = Backend::new(server)?;

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::BlinkingBar)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &backend, session).await;

    // restore terminal
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    backend: &Backend,
    session: &str,
) -> Result<(), Error> {
    let mut app = App::new(backend.base_url(), session);

    terminal.draw(|frame| ui::render(frame, &app))?;
    refresh_status(&mut app, backend).await;

    // server examples win over the built-in list
    if let Ok(examples) = backend.examples().await {
        app.set_examples(examples);
    }

    while app.running {
        terminal.draw(|frame| ui::render(frame, &app))?;

        let Some(event) = poll_event(Duration::from_millis(100))? else {
            continue;
        };

        match handle_event(&mut app, event) {
            Action::Quit => app.running = false,
            Action::Submit(query) => {
                app.loading = true;
                app.notice = None;

                // render loading state
                terminal.draw(|frame| ui::render(frame, &app))?;

                let request = QueryRequest {
                    query,
                    history: app.history_before_last(),
                    session_id: Some(session.to_string()),
                    dry_run: false,
                };

                match backend.query(&request).await {
                    Ok(reply) => app.push_reply(reply),
                    Err(e) => app.push_error(&e.to_string()),
                }
            }
            Action::Clear => {
                app.clear_history();
                if let Err(e) = backend.clear_session(session).await {
                    app.log(LogLevel::Warn, format!("server memory not cleared: {e}"));
                }
            }
            Action::Export => match app.transcript() {
                Some(text) => {
                    let filename = app::export_filename(chrono::Local::now());
                    match std::fs::write(&filename, text) {
                        Ok(_) => app.log(LogLevel::Ok, format!("chat saved to {filename}")),
                        Err(e) => app.log(LogLevel::Error, format!("export failed: {e}")),
                    }
                }
                None => app.log(LogLevel::Warn, "nothing to export yet"),
            },
            Action::RefreshHealth => refresh_status(&mut app, backend).await,
            Action::None => {}
        }
    }

    Ok(())
}

async fn refresh_status(app: &mut App, backend: &Backend) {
    let health = backend.health().await.map_err(|e| e.to_string());
    app.status = Status::from_health(health);
}
