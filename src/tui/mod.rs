// TUI module - console line editing and command history
pub mod editor;
pub mod history;
pub mod input;

pub use editor::TerminalEditor;
pub use history::History;
pub use input::InputBuffer;
