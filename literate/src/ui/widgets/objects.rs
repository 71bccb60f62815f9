//! Extracted objects panel

use literate_core::NarrativeObject;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::LiterateTheme;

/// Numbered list of objects with their relationships
pub struct ObjectsWidget<'a> {
    objects: &'a [NarrativeObject],
    scroll: u16,
    theme: &'a LiterateTheme,
}

impl<'a> ObjectsWidget<'a> {
    pub fn new(objects: &'a [NarrativeObject], theme: &'a LiterateTheme) -> Self {
        Self {
            objects,
            scroll: 0,
            theme,
        }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        if self.objects.is_empty() {
            return vec![Line::styled(
                "No narrative objects found yet.",
                self.theme.placeholder_style(),
            )];
        }

        let mut lines = vec![
            Line::from(format!("Found {} narrative objects:", self.objects.len())),
            Line::default(),
        ];
        for (i, object) in self.objects.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::raw(format!("{}. ", i + 1)),
                Span::styled(object.name.as_str(), self.theme.object_name_style()),
            ]));
            lines.push(Line::styled(
                format!("   {}", object.description),
                self.theme.description_style(),
            ));
            for rel in &object.relationships {
                lines.push(Line::styled(
                    format!("   → {}: {}", rel.target, rel.description),
                    self.theme.relationship_style(),
                ));
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for ObjectsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" Objects ({}) ", self.objects.len()))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        // Clamp so scrolling past the end still shows the last line.
        let lines = self.lines();
        let max_scroll = lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll.min(max_scroll), 0))
            .render(area, buf);
    }
}
