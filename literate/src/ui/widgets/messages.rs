//! Status message log

use std::collections::VecDeque;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::Message;
use crate::ui::theme::LiterateTheme;

/// Shows the newest messages that fit, oldest at the top
pub struct MessagesWidget<'a> {
    messages: &'a VecDeque<Message>,
    theme: &'a LiterateTheme,
}

impl<'a> MessagesWidget<'a> {
    pub fn new(messages: &'a VecDeque<Message>, theme: &'a LiterateTheme) -> Self {
        Self { messages, theme }
    }
}

impl Widget for MessagesWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Messages ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let height = block.inner(area).height as usize;
        let skip = self.messages.len().saturating_sub(height);
        let lines: Vec<Line> = self
            .messages
            .iter()
            .skip(skip)
            .map(|m| {
                let style = self.theme.message_style(m.kind);
                Line::from(vec![
                    Span::styled(format!("{} ", m.kind.icon()), style),
                    Span::styled(m.text.as_str(), style),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
