//! Render orchestration for the Literate TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, InputMode, MessageKind};
use crate::ui::widgets::{MessagesWidget, ObjectsWidget, TextInputWidget};

/// Screen areas for the main view
struct AppLayout {
    title_area: Rect,
    text_area: Rect,
    objects_area: Rect,
    messages_area: Rect,
    status_bar: Rect,
}

impl AppLayout {
    /// Text on the left half; objects over messages (80/20) on the right.
    fn calculate(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(80), Constraint::Percentage(20)])
            .split(columns[1]);

        Self {
            title_area: rows[0],
            text_area: columns[0],
            objects_area: right[0],
            messages_area: right[1],
            status_bar: rows[2],
        }
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    let text_widget = TextInputWidget::new(&app.text, &app.theme)
        .cursor_position(app.cursor)
        .active(app.input_mode == InputMode::Editing);
    frame.render_widget(text_widget, layout.text_area);

    let objects_widget = ObjectsWidget::new(&app.objects, &app.theme).scroll(app.objects_scroll);
    frame.render_widget(objects_widget, layout.objects_area);

    frame.render_widget(
        MessagesWidget::new(&app.messages, &app.theme),
        layout.messages_area,
    );

    render_status_bar(frame, app, layout.status_bar);

    if let InputMode::RetryPrompt(buffer) = &app.input_mode {
        render_retry_prompt(frame, app, buffer, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(Span::styled(
        " Literate - Narrative Text Analyzer ",
        app.theme.title_style(),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Activity on the left, hotkeys after it
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (line, col) = app.cursor_line_col();
    let activity_style = if app.activity.is_busy() {
        app.theme.message_style(MessageKind::Warning)
    } else {
        Style::default()
    };
    let status = Line::from(vec![
        Span::styled(
            format!(" {} ", app.activity.label()),
            activity_style.add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| Ln {}, Col {} ", line + 1, col + 1)),
        Span::styled(
            "| Ctrl+R retry  Ctrl+X clear  Ctrl+Q quit",
            app.theme.placeholder_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn render_retry_prompt(frame: &mut Frame, app: &App, buffer: &str, area: Rect) {
    let popup_area = centered_rect_fixed(44, 5, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Retry Object ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let lines = vec![
        Line::from(vec![
            Span::raw(format!("Object number (1-{}): ", app.objects.len())),
            Span::styled(buffer.to_string(), app.theme.object_name_style()),
            Span::styled(" ", app.theme.cursor_style()),
        ]),
        Line::default(),
        Line::styled("Enter to retry, Esc to cancel", app.theme.placeholder_style()),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

/// A rectangle of fixed size centered in `area`, shrunk to fit
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
