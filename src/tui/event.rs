// event handling

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::tui::app::{App, Focus};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Submit(String),
    Clear,
    Export,
    RefreshHealth,
}

pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

pub fn handle_event(app: &mut App, event: Event) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        _ => Action::None,
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    // global keys (work in any focus)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Action::Quit,
            KeyCode::Char('l') => return Action::Clear,
            KeyCode::Char('x') => return Action::Export,
            KeyCode::Char('r') => return Action::RefreshHealth,
            KeyCode::Char('s') => {
                app.toggle_sql();
                return Action::None;
            }
            KeyCode::Char('t') => {
                app.cycle_theme();
                return Action::None;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
            return Action::None;
        }
        KeyCode::PageUp => {
            app.scroll_up(10);
            return Action::None;
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            return Action::None;
        }
        _ => {}
    }

    match app.focus {
        Focus::Input => handle_input_key(app, key),
        Focus::Examples => handle_examples_key(app, key),
    }
}

fn handle_examples_key(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            Action::None
        }
        KeyCode::Enter => match app.submit_example() {
            Some(query) => Action::Submit(query),
            None => Action::None,
        },
        KeyCode::Esc | KeyCode::Char('i') => {
            app.focus = Focus::Input;
            Action::None
        }
        KeyCode::Char('x') => Action::Export,
        KeyCode::Char('r') => Action::RefreshHealth,
        KeyCode::Char('s') => {
            app.toggle_sql();
            Action::None
        }
        KeyCode::Char('t') => {
            app.cycle_theme();
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('a') => app.move_cursor_start(),
            KeyCode::Char('e') => app.move_cursor_end(),
            KeyCode::Char('u') => app.clear_input(),
            _ => {}
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Enter => match app.submit() {
            Some(query) => Action::Submit(query),
            None => Action::None,
        },
        KeyCode::Esc => {
            app.focus = Focus::Examples;
            Action::None
        }
        KeyCode::Char(c) => {
            app.insert_char(c);
            Action::None
        }
        KeyCode::Backspace => {
            app.delete_char();
            Action::None
        }
        KeyCode::Delete => {
            app.delete_char_forward();
            Action::None
        }
        KeyCode::Left => {
            app.move_cursor_left();
            Action::None
        }
        KeyCode::Right => {
            app.move_cursor_right();
            Action::None
        }
        KeyCode::Home => {
            app.move_cursor_start();
            Action::None
        }
        KeyCode::End => {
            app.move_cursor_end();
            Action::None
        }
        KeyCode::Up => {
            app.scroll_up(1);
            Action::None
        }
        KeyCode::Down => {
            app.scroll_down(1);
            Action::None
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::theme::ThemeKind;

    fn app() -> App {
        App::with_theme("http://localhost:5000", "default", ThemeKind::Night)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(app: &mut App, c: char) -> Action {
        handle_event(
            app,
            Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
        )
    }

    #[test]
    fn typing_and_enter_submits() {
        let mut a = app();
        for c in "villa q".chars() {
            assert_eq!(press(&mut a, KeyCode::Char(c)), Action::None);
        }
        assert_eq!(press(&mut a, KeyCode::Enter), Action::Submit("villa q".into()));
    }

    #[test]
    fn q_only_quits_from_sidebar() {
        let mut a = app();
        assert_eq!(press(&mut a, KeyCode::Char('q')), Action::None);
        assert_eq!(a.input, "q");

        press(&mut a, KeyCode::Tab);
        assert_eq!(a.focus, Focus::Examples);
        assert_eq!(press(&mut a, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn sidebar_enter_submits_example() {
        let mut a = app();
        press(&mut a, KeyCode::Esc);
        press(&mut a, KeyCode::Char('j'));
        let expected = a.examples[1].clone();
        assert_eq!(press(&mut a, KeyCode::Enter), Action::Submit(expected));
    }

    #[test]
    fn control_shortcuts() {
        let mut a = app();
        assert_eq!(ctrl(&mut a, 'l'), Action::Clear);
        assert_eq!(ctrl(&mut a, 'x'), Action::Export);
        assert_eq!(ctrl(&mut a, 'c'), Action::Quit);
        assert_eq!(ctrl(&mut a, 's'), Action::None);
        assert!(a.show_sql);
    }
}
