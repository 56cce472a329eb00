// CLI module - Command line interface
pub mod args;
pub mod commands;

pub use args::{Args, EolArg, SocketTarget};
pub use commands::execute_command;
