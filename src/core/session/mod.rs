// Session module - Interactive session loop
pub mod command;
pub mod editor;
pub mod session;
pub mod transfer;

pub use command::{CommandWriter, Pacing};
pub use editor::{EditStep, LineEditor};
pub use session::{Session, SessionConfig, SessionEnd, SessionStats, READ_CHUNK};
pub use transfer::FileTransfer;
