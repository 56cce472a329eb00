//! LinkTerm Library
//!
//! Interactive line terminal for serial ports and TCP sockets: console line
//! editing, paced command transmission, timestamped line output and transparent
//! reconnection.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod tui;

pub use crate::core::session::{Session, SessionConfig, SessionEnd, SessionStats};
pub use crate::core::transport::{ReadOutcome, Transport, TransportType};
pub use crate::domain::config::LinkTermConfig;
pub use crate::domain::error::{ExitStatus, LinkTermError, LinkTermResult};
pub use crate::infrastructure::Endpoint;
