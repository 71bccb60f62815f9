//! Color theme and styling for the Literate TUI

use ratatui::style::{Color, Modifier, Style};

use crate::app::MessageKind;

/// UI color theme
#[derive(Debug, Clone)]
pub struct LiterateTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub placeholder: Color,

    // Objects panel
    pub object_name: Color,
    pub object_description: Color,
    pub relationship: Color,

    // Message colors
    pub info: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
}

impl Default for LiterateTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            placeholder: Color::DarkGray,

            object_name: Color::LightBlue,
            object_description: Color::White,
            relationship: Color::Magenta,

            info: Color::Blue,
            warning: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
        }
    }
}

impl LiterateTheme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::DIM)
    }

    pub fn cursor_style(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    pub fn object_name_style(&self) -> Style {
        Style::default()
            .fg(self.object_name)
            .add_modifier(Modifier::BOLD)
    }

    pub fn description_style(&self) -> Style {
        Style::default().fg(self.object_description)
    }

    pub fn relationship_style(&self) -> Style {
        Style::default()
            .fg(self.relationship)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for a message of the given severity
    pub fn message_style(&self, kind: MessageKind) -> Style {
        let color = match kind {
            MessageKind::Info => self.info,
            MessageKind::Warning => self.warning,
            MessageKind::Error => self.error,
            MessageKind::Success => self.success,
        };
        Style::default().fg(color)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }
}
