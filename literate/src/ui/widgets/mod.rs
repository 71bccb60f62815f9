//! Custom widgets for the Literate TUI

pub mod messages;
pub mod objects;
pub mod text_input;

pub use messages::MessagesWidget;
pub use objects::ObjectsWidget;
pub use text_input::TextInputWidget;
