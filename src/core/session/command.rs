use crate::core::transport::Transport;
use crate::domain::config::{Eol, PacingConfig};
use crate::domain::error::LinkTermResult;
use std::time::Duration;
use tracing::debug;

/// Write-side timing. Delays change when bytes leave, never which bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between two consecutive bytes of a command.
    pub byte_delay: Duration,
    /// Extra pause right before the EOL sequence.
    pub eol_delay: Duration,
    /// Pause after the whole command has been written.
    pub post_delay: Duration,
}

impl From<&PacingConfig> for Pacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            byte_delay: config.byte_delay(),
            eol_delay: config.eol_delay(),
            post_delay: config.post_delay(),
        }
    }
}

/// Turns completed command lines into paced transport writes.
///
/// Dispatch is awaited by the session loop, so pacing holds back all other
/// I/O until the command is out.
#[derive(Debug, Clone)]
pub struct CommandWriter {
    eol: Eol,
    pacing: Pacing,
}

impl CommandWriter {
    pub fn new(eol: Eol, pacing: Pacing) -> Self {
        Self { eol, pacing }
    }

    pub fn eol(&self) -> Eol {
        self.eol
    }

    /// The exact bytes a command puts on the wire.
    pub fn encode(&self, command: &str) -> Vec<u8> {
        let mut frame = Vec::with_capacity(command.len() + 2);
        frame.extend_from_slice(command.as_bytes());
        frame.extend_from_slice(self.eol.as_bytes());
        frame
    }

    pub async fn dispatch<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        command: &str,
    ) -> LinkTermResult<()> {
        let body = command.as_bytes();
        let eol = self.eol.as_bytes();

        if self.pacing.byte_delay.is_zero() && self.pacing.eol_delay.is_zero() {
            transport.write(&self.encode(command))?;
        } else {
            self.write_paced(transport, body, false).await?;
            if !self.pacing.eol_delay.is_zero() {
                tokio::time::sleep(self.pacing.eol_delay).await;
            }
            self.write_paced(transport, eol, !body.is_empty()).await?;
        }
        debug!(bytes = body.len() + eol.len(), "Command sent");

        if !self.pacing.post_delay.is_zero() {
            tokio::time::sleep(self.pacing.post_delay).await;
        }
        Ok(())
    }

    async fn write_paced<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        bytes: &[u8],
        mut follows_byte: bool,
    ) -> LinkTermResult<()> {
        if self.pacing.byte_delay.is_zero() {
            if !bytes.is_empty() {
                transport.write(bytes)?;
            }
            return Ok(());
        }
        for byte in bytes {
            if follows_byte {
                tokio::time::sleep(self.pacing.byte_delay).await;
            }
            transport.write(std::slice::from_ref(byte))?;
            follows_byte = true;
        }
        Ok(())
    }
}
