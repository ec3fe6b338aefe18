//! Stencil CLI library: the terminal prompter and `list` rendering used by the `stencil` binary.

pub mod list;
pub mod prompt;

pub use list::{render_json, render_text};
pub use prompt::TerminalPrompter;
