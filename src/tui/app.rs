// app state for the chat ui

use chrono::{DateTime, Local};

use crate::api::{EXAMPLES, HealthResponse, QueryResponse};
use crate::core::history::{self, ChatMessage, Role};
use crate::tui::theme::{Theme, ThemeKind, detect_theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Examples,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Unknown,
    Healthy,
    Degraded,
    Down(String),
}

impl Status {
    pub fn from_health(health: Result<HealthResponse, String>) -> Self {
        match health {
            Ok(h) if h.db_connected => Status::Healthy,
            Ok(_) => Status::Degraded,
            Err(e) => Status::Down(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Ok,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub message: ChatMessage,
    pub sql: Option<String>,
    // what the server said, before decoration; None for failed requests
    pub reply: Option<String>,
}

pub struct App {
    pub running: bool,
    pub focus: Focus,
    pub theme_kind: ThemeKind,
    pub theme: Theme,

    pub server: String,
    pub session: String,
    pub status: Status,

    pub examples: Vec<String>,
    pub selected: usize,

    pub entries: Vec<Entry>,
    pub show_sql: bool,
    // lines scrolled up from the bottom of the transcript
    pub scroll: u16,

    pub input: String,
    // cursor position in chars
    pub cursor: usize,

    pub loading: bool,
    pub notice: Option<(LogLevel, String)>,
}

impl App {
    pub fn new(server: &str, session: &str) -> Self {
        Self::with_theme(server, session, detect_theme())
    }

    pub fn with_theme(server: &str, session: &str, theme_kind: ThemeKind) -> Self {
        Self {
            running: true,
            focus: Focus::Input,
            theme_kind,
            theme: Theme::from_kind(theme_kind),
            server: server.to_string(),
            session: session.to_string(),
            status: Status::Unknown,
            examples: EXAMPLES.iter().map(|e| e.to_string()).collect(),
            selected: 0,
            entries: Vec::new(),
            show_sql: false,
            scroll: 0,
            input: String::new(),
            cursor: 0,
            loading: false,
            notice: None,
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.notice = Some((level, message.into()));
    }

    // -- input editing --

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.input.remove(at);
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor < self.input.chars().count() {
            let at = self.byte_index();
            self.input.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_cursor_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    // -- conversation --

    /// Take the typed question, recording it as a user message.
    pub fn submit(&mut self) -> Option<String> {
        let query = self.input.trim().to_string();
        if query.is_empty() || self.loading {
            return None;
        }
        self.clear_input();
        self.push_user(&query);
        Some(query)
    }

    /// Take the highlighted example as the next question.
    pub fn submit_example(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        let query = self.examples.get(self.selected)?.clone();
        self.focus = Focus::Input;
        self.push_user(&query);
        Some(query)
    }

    fn push_user(&mut self, query: &str) {
        self.entries.push(Entry {
            message: ChatMessage::user(query),
            sql: None,
            reply: None,
        });
        self.scroll = 0;
    }

    pub fn push_reply(&mut self, reply: QueryResponse) {
        let mut content = decorate(&reply.response);
        if let Some(warning) = &reply.warning {
            content.push_str(&format!("\n({warning})"));
        }
        self.entries.push(Entry {
            message: ChatMessage::assistant(content),
            sql: reply.sql,
            reply: Some(reply.response),
        });
        self.loading = false;
        self.scroll = 0;
    }

    pub fn push_error(&mut self, error: &str) {
        self.entries.push(Entry {
            message: ChatMessage::assistant(format!("**Error:** {error}")),
            sql: None,
            reply: None,
        });
        self.loading = false;
        self.scroll = 0;
        self.log(LogLevel::Error, "request failed, is the server running?");
    }

    /// Answered turns before the question currently being asked, as the
    /// server sent them. Failed requests and their questions are left out.
    pub fn history_before_last(&self) -> Vec<ChatMessage> {
        let end = match self.entries.last() {
            Some(e) if e.message.role == Role::User => self.entries.len() - 1,
            _ => self.entries.len(),
        };
        let entries = &self.entries[..end];

        entries
            .iter()
            .zip(entries.iter().skip(1).map(Some).chain([None]))
            .filter_map(|(entry, next)| match entry.message.role {
                Role::User => next
                    .and_then(|n| n.reply.as_ref())
                    .map(|_| entry.message.clone()),
                Role::Assistant => entry.reply.clone().map(ChatMessage::assistant),
            })
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.entries.clear();
        self.scroll = 0;
        self.log(LogLevel::Ok, "chat history cleared");
    }

    pub fn transcript(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let messages: Vec<ChatMessage> = self.entries.iter().map(|e| e.message.clone()).collect();
        Some(history::transcript(&messages))
    }

    /// Shortened view of the last `n` messages for the sidebar.
    pub fn recent(&self, n: usize) -> Vec<(Role, String)> {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..]
            .iter()
            .map(|e| (e.message.role, shorten(&e.message.content, 60)))
            .collect()
    }

    // -- navigation --

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Examples,
            Focus::Examples => Focus::Input,
        };
    }

    pub fn select_next(&mut self) {
        if !self.examples.is_empty() {
            self.selected = (self.selected + 1) % self.examples.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.examples.is_empty() {
            self.selected = (self.selected + self.examples.len() - 1) % self.examples.len();
        }
    }

    pub fn set_examples(&mut self, examples: Vec<String>) {
        if !examples.is_empty() {
            self.examples = examples;
            self.selected = 0;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn toggle_sql(&mut self) {
        self.show_sql = !self.show_sql;
    }

    pub fn cycle_theme(&mut self) {
        self.theme_kind = self.theme_kind.next();
        self.theme = Theme::from_kind(self.theme_kind);
        self.log(LogLevel::Info, format!("theme: {}", self.theme_kind.name()));
    }
}

/// Headline the match count when the answer lists properties.
pub fn decorate(answer: &str) -> String {
    let lower = answer.to_lowercase();
    if answer.starts_with("Found ") || !(lower.contains("found") || lower.contains("match")) {
        return answer.to_string();
    }

    let matches = answer
        .lines()
        .filter(|l| l.contains("AED") || l.to_lowercase().contains("bedroom"))
        .count();

    if matches == 0 {
        answer.to_string()
    } else {
        format!("**Found {matches} matching properties**\n\n{answer}")
    }
}

pub fn export_filename(now: DateTime<Local>) -> String {
    format!("dubai_chat_{}.txt", now.format("%Y%m%d_%H%M"))
}

fn shorten(s: &str, max: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() > max {
        let head: String = flat.chars().take(max).collect();
        format!("{head}...")
    } else {
        flat
    }
}
