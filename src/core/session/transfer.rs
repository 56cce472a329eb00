use crate::core::transport::Transport;
use crate::domain::error::LinkTermResult;
use std::path::Path;

/// Bulk file sender (for example XMODEM) that takes over the transport.
///
/// The session stops reading from the transport for the whole call and
/// resumes afterwards, so the sender sees every byte the peer returns.
pub trait FileTransfer {
    fn send_file(&mut self, transport: &mut dyn Transport, path: &Path) -> LinkTermResult<()>;
}
