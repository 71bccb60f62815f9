//! UI module for the Literate TUI

pub mod render;
pub mod theme;
pub mod widgets;
