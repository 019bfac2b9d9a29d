// ui rendering

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::core::history::Role;
use crate::tui::app::{App, Focus, LogLevel, Status};

pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;

    frame.render_widget(Clear, frame.area());
    frame.render_widget(Block::default().style(theme.base()), frame.area());

    // header + body + input + footer
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, main[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(main[1]);

    render_sidebar(frame, app, body[0]);
    render_chat(frame, app, body[1]);
    render_input(frame, app, main[2]);
    render_footer(frame, app, main[3]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let (status, style) = match &app.status {
        Status::Healthy => ("backend connected".to_string(), theme.success()),
        Status::Degraded => ("backend up, database unreachable".to_string(), theme.warning()),
        Status::Down(e) => (format!("backend not running: {e}"), theme.error()),
        Status::Unknown => ("checking backend...".to_string(), theme.muted()),
    };

    let mut spans = vec![
        Span::styled(" Dubai Property Finder ", theme.title()),
        Span::styled("| ", theme.border()),
        Span::styled(status, style),
        Span::styled(format!("  {}", app.server), theme.muted()),
    ];
    if app.loading {
        spans.push(Span::styled("  searching Dubai properties...", theme.accent()));
    }

    let header = Paragraph::new(Line::from(spans)).style(theme.base()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border()),
    );
    frame.render_widget(header, area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(app.examples.len() as u16 + 2),
            Constraint::Min(3),
        ])
        .split(area);

    let focused = app.focus == Focus::Examples;
    let items: Vec<ListItem> = app
        .examples
        .iter()
        .map(|e| ListItem::new(e.as_str()))
        .collect();

    let list = List::new(items)
        .style(theme.base())
        .highlight_style(if focused {
            theme.selected()
        } else {
            Style::default()
        })
        .highlight_symbol("> ")
        .block(
            Block::default()
                .title(Span::styled(" Quick Examples ", theme.title()))
                .borders(Borders::ALL)
                .border_style(if focused {
                    theme.focused_border()
                } else {
                    theme.border()
                }),
        );

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, parts[0], &mut state);

    let recent: Vec<Line> = app
        .recent(10)
        .into_iter()
        .map(|(role, text)| {
            let (label, style) = match role {
                Role::User => ("You", theme.user()),
                Role::Assistant => ("AI", theme.accent()),
            };
            Line::from(vec![
                Span::styled(format!("{label}: "), style),
                Span::styled(text, theme.muted()),
            ])
        })
        .collect();

    let recent = Paragraph::new(recent)
        .style(theme.base())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(" Past Conversation ", theme.title()))
                .borders(Borders::ALL)
                .border_style(theme.border()),
        );
    frame.render_widget(recent, parts[1]);
}

fn render_chat(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let mut lines: Vec<Line> = Vec::new();
    if app.entries.is_empty() {
        lines.push(Line::styled(
            "Ask naturally, e.g. villas under 10M in Palm Jumeirah",
            theme.muted(),
        ));
    }

    for entry in &app.entries {
        let (label, style) = match entry.message.role {
            Role::User => ("you", theme.user()),
            Role::Assistant => ("assistant", theme.accent()),
        };
        lines.push(Line::styled(label, style));
        for text in entry.message.content.lines() {
            let style = if text.starts_with("**Error:**") {
                theme.error()
            } else {
                theme.base()
            };
            lines.push(Line::styled(format!("  {}", text.replace("**", "")), style));
        }
        if app.show_sql {
            if let Some(sql) = &entry.sql {
                lines.push(Line::styled(format!("  sql: {sql}"), theme.muted()));
            }
        }
        lines.push(Line::default());
    }

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let bottom = total.saturating_sub(inner_height);
    let offset = bottom.saturating_sub(app.scroll);

    let chat = Paragraph::new(lines)
        .style(theme.base())
        .wrap(Wrap { trim: false })
        .scroll((offset, 0))
        .block(
            Block::default()
                .title(Span::styled(" Chat ", theme.title()))
                .borders(Borders::ALL)
                .border_style(theme.border()),
        );
    frame.render_widget(chat, area);
}

// rows the lines take once wrapped to `width`
fn wrapped_height(lines: &[Line], width: usize) -> u16 {
    lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(width) as u16)
        .fold(0u16, |acc, h| acc.saturating_add(h))
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let focused = app.focus == Focus::Input;

    let input = Paragraph::new(app.input.as_str()).style(theme.base()).block(
        Block::default()
            .title(Span::styled(" Ask about Dubai properties ", theme.title()))
            .borders(Borders::ALL)
            .border_style(if focused {
                theme.focused_border()
            } else {
                theme.border()
            }),
    );
    frame.render_widget(input, area);

    if focused {
        let x = area.x + 1 + app.cursor as u16;
        frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let line = match &app.notice {
        Some((level, message)) => {
            let style = match level {
                LogLevel::Ok => theme.success(),
                LogLevel::Info => theme.accent(),
                LogLevel::Warn => theme.warning(),
                LogLevel::Error => theme.error(),
            };
            Line::styled(message.as_str(), style)
        }
        None => Line::from(vec![
            Span::styled(" Enter ", theme.base().bg(theme.accent).fg(theme.bg)),
            Span::styled(" Ask ", theme.muted()),
            Span::styled("| ", theme.border()),
            Span::styled("Tab ", theme.accent()),
            Span::styled("Examples ", theme.muted()),
            Span::styled("| ", theme.border()),
            Span::styled("^S ", theme.accent()),
            Span::styled("SQL ", theme.muted()),
            Span::styled("^L ", theme.accent()),
            Span::styled("Clear ", theme.muted()),
            Span::styled("^X ", theme.accent()),
            Span::styled("Export ", theme.muted()),
            Span::styled("^R ", theme.accent()),
            Span::styled("Status ", theme.muted()),
            Span::styled("^T ", theme.accent()),
            Span::styled("Theme ", theme.muted()),
            Span::styled("| ", theme.border()),
            Span::styled("^C ", theme.accent()),
            Span::styled("Quit", theme.muted()),
        ]),
    };

    let footer = Paragraph::new(line)
        .style(theme.base())
        .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
