//! Multi-line text input widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::LiterateTheme;

/// Editor for the narrative text
pub struct TextInputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a LiterateTheme,
    placeholder: &'a str,
    is_active: bool,
}

impl<'a> TextInputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a LiterateTheme) -> Self {
        Self {
            content,
            cursor_position: content.len(),
            theme,
            placeholder: "Type or paste narrative text...",
            is_active: true,
        }
    }

    /// Cursor as a byte offset into the content
    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos.min(self.content.len());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    fn lines(&self) -> (Vec<Line<'a>>, usize) {
        let mut lines = Vec::new();
        let mut cursor_line = 0;
        let mut offset = 0;

        for (index, raw) in self.content.split('\n').enumerate() {
            let start = offset;
            let end = start + raw.len();
            offset = end + 1;

            if !(start..=end).contains(&self.cursor_position) || !self.is_active {
                lines.push(Line::styled(raw, self.theme.text_style()));
                continue;
            }

            cursor_line = index;
            let col = self.cursor_position - start;
            let (before, rest) = raw.split_at(col);
            let mut chars = rest.chars();
            let (under, after) = match chars.next() {
                Some(c) => (&rest[..c.len_utf8()], chars.as_str()),
                None => (" ", ""),
            };
            lines.push(Line::from(vec![
                Span::styled(before, self.theme.text_style()),
                Span::styled(under, self.theme.cursor_style()),
                Span::styled(after, self.theme.text_style()),
            ]));
        }

        (lines, cursor_line)
    }
}

impl Widget for TextInputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Text ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let line = Line::from(vec![
                Span::styled(" ", self.theme.cursor_style()),
                Span::styled(self.placeholder, self.theme.placeholder_style()),
            ]);
            Paragraph::new(line).render(inner, buf);
            return;
        }

        // Keep the cursor's line in view; wrapped lines may push it a little lower.
        let (lines, cursor_line) = self.lines();
        let visible = inner.height.max(1) as usize;
        let scroll = cursor_line.saturating_sub(visible - 1);

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll.min(u16::MAX as usize) as u16, 0))
            .render(inner, buf);
    }
}
