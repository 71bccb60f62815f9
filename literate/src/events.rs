//! Event handling for the Literate TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};

/// Result of handling an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// Re-extract the named object
    Retry(String),
    /// Drop every object
    Clear,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Paste(text) if app.input_mode == InputMode::Editing => {
            app.insert_str(&text);
            EventResult::NeedsRedraw
        }
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Mouse wheel scrolls the objects panel
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_objects_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_objects_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') | KeyCode::Char('q') = key.code {
            return EventResult::Quit;
        }
    }

    match app.input_mode {
        InputMode::Editing => handle_editing(app, key),
        InputMode::RetryPrompt(_) => handle_retry_prompt(app, key),
    }
}

fn handle_editing(app: &mut App, key: KeyEvent) -> EventResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('r') => {
                app.open_retry_prompt();
                EventResult::NeedsRedraw
            }
            KeyCode::Char('x') => EventResult::Clear,
            _ => EventResult::Continue,
        };
    }

    match key.code {
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Tab => app.insert_str("    "),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::PageUp => app.scroll_objects_up(10),
        KeyCode::PageDown => app.scroll_objects_down(10),
        KeyCode::Char(c) => app.insert_char(c),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_retry_prompt(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.cancel_retry_prompt();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => match app.submit_retry_prompt() {
            Some(name) => EventResult::Retry(name),
            None => EventResult::NeedsRedraw,
        },
        KeyCode::Backspace => {
            if let InputMode::RetryPrompt(buffer) = &mut app.input_mode {
                buffer.pop();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if let InputMode::RetryPrompt(buffer) = &mut app.input_mode {
                buffer.push(c);
            }
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
