//! Application state for the Literate TUI

use std::collections::VecDeque;

use literate_core::{NarrativeObject, OrchestratorEvent, OrchestratorHandle, UpdateError, UpdateResult};
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};

use crate::ui::theme::LiterateTheme;

/// Maximum messages kept in the message log
const MAX_MESSAGES: usize = 100;

/// Message severity shown in the message panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    Success,
}

impl MessageKind {
    /// Tag used in headless output
    pub fn tag(&self) -> &'static str {
        match self {
            MessageKind::Info => "INFO",
            MessageKind::Warning => "WARN",
            MessageKind::Error => "ERROR",
            MessageKind::Success => "OK",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MessageKind::Info => "•",
            MessageKind::Warning => "!",
            MessageKind::Error => "✗",
            MessageKind::Success => "✓",
        }
    }
}

/// A line in the message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// What the orchestrator is currently doing, reconstructed from its events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Activity {
    waiting: bool,
    extracting: bool,
    deferred: bool,
    correcting: Option<String>,
}

impl Activity {
    pub fn observe(&mut self, event: &OrchestratorEvent) {
        match event {
            OrchestratorEvent::DebounceScheduled { .. } => self.waiting = true,
            OrchestratorEvent::DebounceCancelled => self.waiting = false,
            OrchestratorEvent::ExtractionStarted { .. } => {
                self.waiting = false;
                self.deferred = false;
                self.extracting = true;
            }
            OrchestratorEvent::ExtractionDeferred => {
                self.waiting = false;
                self.deferred = true;
            }
            OrchestratorEvent::ExtractionFinished(_) => self.extracting = false,
            OrchestratorEvent::CorrectionStarted { name } => self.correcting = Some(name.clone()),
            OrchestratorEvent::CorrectionFinished { name, result } => {
                // A busy refusal for the running correction leaves it running.
                let refused = matches!(result.error, Some(UpdateError::Busy));
                if !refused && self.correcting.as_deref() == Some(name.as_str()) {
                    self.correcting = None;
                }
            }
            OrchestratorEvent::Cleared | OrchestratorEvent::Removed { .. } => {}
        }
    }

    /// No debounce pending and no model call running or queued
    pub fn is_idle(&self) -> bool {
        !self.waiting && !self.extracting && !self.deferred && self.correcting.is_none()
    }

    pub fn is_busy(&self) -> bool {
        self.extracting || self.correcting.is_some()
    }

    /// Short status line for the footer
    pub fn label(&self) -> String {
        if let Some(name) = &self.correcting {
            format!("Retrying '{name}'...")
        } else if self.extracting && self.deferred {
            "Analyzing (newer text queued)...".to_string()
        } else if self.extracting {
            "Analyzing text...".to_string()
        } else if self.waiting {
            "Waiting for typing to pause...".to_string()
        } else {
            "Ready".to_string()
        }
    }
}

/// Input mode for the text editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Typing narrative text
    Editing,
    /// Entering the number of an object to retry
    RetryPrompt(String),
}

/// Main application state
pub struct App {
    pub handle: OrchestratorHandle,
    events: UnboundedReceiver<OrchestratorEvent>,

    /// Narrative text being analyzed
    pub text: String,
    /// Cursor position as a byte offset into `text`
    pub cursor: usize,
    text_dirty: bool,

    /// Objects, most recently updated first
    pub objects: Vec<NarrativeObject>,
    pub objects_scroll: u16,

    pub messages: VecDeque<Message>,
    pub activity: Activity,
    pub input_mode: InputMode,
    pub theme: LiterateTheme,
}

impl App {
    pub fn new(
        handle: OrchestratorHandle,
        events: UnboundedReceiver<OrchestratorEvent>,
        objects: Vec<NarrativeObject>,
    ) -> Self {
        let mut app = Self {
            handle,
            events,
            text: String::new(),
            cursor: 0,
            text_dirty: false,
            objects,
            objects_scroll: 0,
            messages: VecDeque::new(),
            activity: Activity::default(),
            input_mode: InputMode::Editing,
            theme: LiterateTheme::default(),
        };
        app.push_message(MessageKind::Info, "Ready to analyze text...");
        if !app.objects.is_empty() {
            let count = app.objects.len();
            app.push_message(MessageKind::Info, format!("Loaded {count} saved objects"));
        }
        app
    }

    pub fn push_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.messages.push_back(Message::new(kind, text));
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    // Text editing

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.text_dirty = true;
    }

    pub fn insert_str(&mut self, s: &str) {
        // Terminals paste with carriage returns.
        let s = s.replace("\r\n", "\n").replace('\r', "\n");
        self.text.insert_str(self.cursor, &s);
        self.cursor += s.len();
        self.text_dirty = true;
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
            self.text.remove(self.cursor);
            self.text_dirty = true;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
            self.text_dirty = true;
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(prev) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(next) = self.text[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    /// Zero-based line and column (in chars) of the cursor
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let col = before
            .rfind('\n')
            .map_or(before, |i| &before[i + 1..])
            .chars()
            .count();
        (line, col)
    }

    /// Text to hand to the orchestrator, if it changed since the last call
    pub fn take_text_change(&mut self) -> Option<String> {
        if std::mem::take(&mut self.text_dirty) {
            Some(self.text.clone())
        } else {
            None
        }
    }

    // Objects panel

    pub fn scroll_objects_up(&mut self, amount: u16) {
        self.objects_scroll = self.objects_scroll.saturating_sub(amount);
    }

    pub fn scroll_objects_down(&mut self, amount: u16) {
        self.objects_scroll = self.objects_scroll.saturating_add(amount);
    }

    // Retry prompt

    pub fn open_retry_prompt(&mut self) {
        if self.objects.is_empty() {
            self.push_message(MessageKind::Warning, "No objects to retry");
            return;
        }
        self.input_mode = InputMode::RetryPrompt(String::new());
    }

    pub fn cancel_retry_prompt(&mut self) {
        self.input_mode = InputMode::Editing;
    }

    /// Close the prompt and resolve the typed number to an object name.
    pub fn submit_retry_prompt(&mut self) -> Option<String> {
        let InputMode::RetryPrompt(buffer) = std::mem::replace(&mut self.input_mode, InputMode::Editing)
        else {
            return None;
        };
        match resolve_target(buffer.trim(), &self.objects) {
            Some(name) => Some(name),
            None => {
                let count = self.objects.len();
                self.push_message(
                    MessageKind::Warning,
                    format!("Enter a number between 1 and {count}"),
                );
                None
            }
        }
    }

    // Orchestrator events

    /// Apply every event the orchestrator has emitted so far.
    ///
    /// Returns false once the orchestrator has gone away.
    pub fn drain_events(&mut self) -> bool {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    pub fn apply_event(&mut self, event: OrchestratorEvent) {
        self.activity.observe(&event);
        if let Some(message) = event_message(&event) {
            self.messages.push_back(message);
            while self.messages.len() > MAX_MESSAGES {
                self.messages.pop_front();
            }
        }

        match event {
            OrchestratorEvent::ExtractionFinished(result)
            | OrchestratorEvent::CorrectionFinished { result, .. } => {
                if result.error.is_none() {
                    self.objects = result.objects;
                }
            }
            OrchestratorEvent::Cleared => {
                self.objects.clear();
                self.objects_scroll = 0;
            }
            OrchestratorEvent::Removed {
                name,
                removed: true,
            } => self.objects.retain(|o| o.name != name),
            _ => {}
        }
    }
}

/// Resolve a retry target given as a 1-based index or an exact name.
pub fn resolve_target(arg: &str, objects: &[NarrativeObject]) -> Option<String> {
    if let Ok(index) = arg.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| objects.get(i))
            .map(|o| o.name.clone());
    }
    objects
        .iter()
        .find(|o| o.name == arg)
        .map(|o| o.name.clone())
}

/// User-facing message for an orchestrator event, if it deserves one.
pub fn event_message(event: &OrchestratorEvent) -> Option<Message> {
    match event {
        OrchestratorEvent::DebounceScheduled { .. } | OrchestratorEvent::DebounceCancelled => None,
        OrchestratorEvent::ExtractionStarted { chars } => Some(Message::new(
            MessageKind::Info,
            format!("Analyzing text ({chars} characters)..."),
        )),
        OrchestratorEvent::ExtractionDeferred => Some(Message::new(
            MessageKind::Info,
            "Analysis in progress; latest text queued",
        )),
        OrchestratorEvent::ExtractionFinished(result) => Some(extraction_message(result)),
        OrchestratorEvent::CorrectionStarted { name } => Some(Message::new(
            MessageKind::Info,
            format!("Retrying '{name}'..."),
        )),
        OrchestratorEvent::CorrectionFinished { name, result } => Some(match &result.error {
            None => Message::new(MessageKind::Success, format!("Corrected '{name}'")),
            Some(UpdateError::Busy) => Message::new(
                MessageKind::Warning,
                "Analysis in progress; try again when it finishes",
            ),
            Some(UpdateError::NotFound { .. }) | Some(UpdateError::NoText) => {
                Message::new(MessageKind::Warning, describe_error(result.error.as_ref()))
            }
            Some(_) => Message::new(
                MessageKind::Error,
                format!("Retry of '{name}' failed: {}", describe_error(result.error.as_ref())),
            ),
        }),
        OrchestratorEvent::Cleared => Some(Message::new(MessageKind::Success, "Cleared all objects")),
        OrchestratorEvent::Removed { name, removed } => Some(if *removed {
            Message::new(MessageKind::Success, format!("Removed '{name}'"))
        } else {
            Message::new(MessageKind::Warning, format!("Object '{name}' not found"))
        }),
    }
}

fn extraction_message(result: &UpdateResult) -> Message {
    if let Some(err) = &result.error {
        return Message::new(MessageKind::Error, describe_error(Some(err)));
    }
    let stats = &result.stats;
    if !stats.has_changes() {
        return Message::new(
            MessageKind::Info,
            format!("No changes ({} objects)", result.total_count),
        );
    }
    let mut parts = Vec::new();
    if stats.added > 0 {
        parts.push(format!("{} added", stats.added));
    }
    if stats.updated > 0 {
        parts.push(format!("{} updated", stats.updated));
    }
    if stats.removed > 0 {
        parts.push(format!("{} removed", stats.removed));
    }
    Message::new(
        MessageKind::Success,
        format!("{} ({} objects total)", parts.join(", "), result.total_count),
    )
}

fn describe_error(error: Option<&UpdateError>) -> String {
    use llm_client::Error as ModelError;

    match error {
        None => String::new(),
        Some(UpdateError::Model(ModelError::Connection { provider, url, .. })) => {
            format!("Cannot reach {provider} at {url}. Is it running?")
        }
        Some(UpdateError::Model(ModelError::Authentication { provider, .. })) => {
            format!("{provider} rejected the API key")
        }
        Some(UpdateError::Model(ModelError::NoApiKey(var))) => format!("{var} is not set"),
        Some(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use literate_core::MergeStats;
    use std::time::Duration;

    fn objects(names: &[&str]) -> Vec<NarrativeObject> {
        names
            .iter()
            .map(|n| NarrativeObject::new(*n, "desc", Vec::new()))
            .collect()
    }

    fn finished(stats: MergeStats, error: Option<UpdateError>) -> OrchestratorEvent {
        OrchestratorEvent::ExtractionFinished(UpdateResult {
            stats,
            objects: Vec::new(),
            total_count: 2,
            error,
        })
    }

    #[test]
    fn test_resolve_target() {
        let objs = objects(&["Alice", "Bob"]);
        assert_eq!(resolve_target("2", &objs), Some("Bob".to_string()));
        assert_eq!(resolve_target("Alice", &objs), Some("Alice".to_string()));
        assert_eq!(resolve_target("0", &objs), None);
        assert_eq!(resolve_target("3", &objs), None);
        assert_eq!(resolve_target("Carol", &objs), None);
    }

    #[test]
    fn test_activity_tracks_extraction() {
        let mut activity = Activity::default();
        assert!(activity.is_idle());

        activity.observe(&OrchestratorEvent::DebounceScheduled {
            delay: Duration::from_secs(3),
        });
        assert!(!activity.is_idle());
        assert!(!activity.is_busy());

        activity.observe(&OrchestratorEvent::ExtractionStarted { chars: 10 });
        assert!(activity.is_busy());

        activity.observe(&OrchestratorEvent::ExtractionDeferred);
        activity.observe(&finished(MergeStats::default(), None));
        assert!(!activity.is_idle());

        activity.observe(&OrchestratorEvent::ExtractionStarted { chars: 12 });
        activity.observe(&finished(MergeStats::default(), None));
        assert!(activity.is_idle());
    }

    #[test]
    fn test_refused_retry_keeps_extraction_busy() {
        let mut activity = Activity::default();
        activity.observe(&OrchestratorEvent::ExtractionStarted { chars: 10 });
        activity.observe(&OrchestratorEvent::CorrectionFinished {
            name: "Alice".to_string(),
            result: UpdateResult {
                stats: MergeStats::default(),
                objects: Vec::new(),
                total_count: 0,
                error: Some(UpdateError::Busy),
            },
        });
        assert!(activity.is_busy());
    }

    #[test]
    fn test_busy_refusal_keeps_running_correction() {
        let finished_with = |error: Option<UpdateError>| OrchestratorEvent::CorrectionFinished {
            name: "Alice".to_string(),
            result: UpdateResult {
                stats: MergeStats::default(),
                objects: Vec::new(),
                total_count: 0,
                error,
            },
        };

        let mut activity = Activity::default();
        activity.observe(&OrchestratorEvent::CorrectionStarted {
            name: "Alice".to_string(),
        });
        activity.observe(&finished_with(Some(UpdateError::Busy)));
        assert!(activity.is_busy());
        assert!(!activity.is_idle());
        assert_eq!(activity.label(), "Retrying 'Alice'...");

        activity.observe(&finished_with(None));
        assert!(activity.is_idle());
    }

    #[test]
    fn test_extraction_message() {
        let stats = MergeStats {
            added: 1,
            updated: 1,
            unchanged: 0,
            removed: 0,
        };
        let msg = event_message(&finished(stats, None)).unwrap();
        assert_eq!(msg.kind, MessageKind::Success);
        assert_eq!(msg.text, "1 added, 1 updated (2 objects total)");

        let msg = event_message(&finished(MergeStats::default(), None)).unwrap();
        assert_eq!(msg.kind, MessageKind::Info);

        let msg = event_message(&finished(MergeStats::default(), Some(UpdateError::NoText))).unwrap();
        assert_eq!(msg.kind, MessageKind::Error);
    }

    fn test_app() -> App {
        use literate_core::{spawn_orchestrator, MockModel, ObjectManager, OrchestratorConfig};
        use std::sync::Arc;

        let (handle, events) = spawn_orchestrator(
            Arc::new(MockModel::new()),
            ObjectManager::new(),
            OrchestratorConfig::new(),
        );
        App::new(handle, events, objects(&["Alice", "Bob"]))
    }

    #[tokio::test]
    async fn test_text_editing() {
        let mut app = test_app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.insert_str("\r\nworld");
        assert_eq!(app.text, "héllo\nworld");
        assert_eq!(app.cursor_line_col(), (1, 5));
        assert_eq!(app.take_text_change().as_deref(), Some("héllo\nworld"));
        assert_eq!(app.take_text_change(), None);

        app.cursor_home();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.text, "héll\nworld");
        assert_eq!(app.cursor_line_col(), (0, 4));

        app.cursor_home();
        app.cursor_right();
        app.delete();
        assert_eq!(app.text, "hll\nworld");
        assert!(app.take_text_change().is_some());
    }

    #[tokio::test]
    async fn test_retry_prompt() {
        let mut app = test_app();
        app.open_retry_prompt();
        app.input_mode = InputMode::RetryPrompt("2".to_string());
        assert_eq!(app.submit_retry_prompt(), Some("Bob".to_string()));
        assert_eq!(app.input_mode, InputMode::Editing);

        app.open_retry_prompt();
        app.input_mode = InputMode::RetryPrompt("9".to_string());
        assert_eq!(app.submit_retry_prompt(), None);
        assert_eq!(app.messages.back().unwrap().kind, MessageKind::Warning);
    }

    #[tokio::test]
    async fn test_apply_events_update_objects() {
        let mut app = test_app();
        app.apply_event(OrchestratorEvent::Removed {
            name: "Alice".to_string(),
            removed: true,
        });
        assert_eq!(app.objects.len(), 1);

        app.apply_event(OrchestratorEvent::Cleared);
        assert!(app.objects.is_empty());
    }

    #[test]
    fn test_debounce_events_are_silent() {
        assert!(event_message(&OrchestratorEvent::DebounceCancelled).is_none());
    }
}
