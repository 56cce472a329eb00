use crate::core::transport::{ReadOutcome, Transport, TransportType};
use crate::domain::{
    config::ConnectionConfig,
    error::{LinkTermError, LinkTermResult},
};
use serialport::{SerialPort, TTYPort};
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on how long a command write may wait for the driver.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial device transport. Reads never block: the port runs with a zero
/// timeout except while a write is in progress.
pub struct SerialClient {
    path: String,
    baud_rate: u32,
    port: Option<TTYPort>,
}

impl SerialClient {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            port: None,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> LinkTermResult<Self> {
        match config {
            ConnectionConfig::Serial { port, baud_rate } => Ok(Self::new(port.clone(), *baud_rate)),
            _ => Err(LinkTermError::InvalidInput(
                "Invalid connection type for serial client".to_string(),
            )),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn port_mut(&mut self) -> LinkTermResult<&mut TTYPort> {
        self.port.as_mut().ok_or(LinkTermError::NotConnected)
    }
}

impl fmt::Display for SerialClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.baud_rate)
    }
}

impl Transport for SerialClient {
    fn transport_type(&self) -> TransportType {
        TransportType::Serial
    }

    fn open(&mut self) -> LinkTermResult<()> {
        self.close()?;
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(Duration::ZERO)
            .open_native()
            .map_err(|e| LinkTermError::connection(&*self, e))?;
        debug!(port = %self, "Serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome> {
        let port = self.port_mut()?;
        match port.read(buf) {
            Ok(0) => Ok(ReadOutcome::Idle),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(ReadOutcome::Idle)
            }
            Err(e) => {
                // The driver has no clean end-of-stream; any other failure means
                // the device went away.
                warn!(port = %self, error = %e, "Serial read failed");
                Ok(ReadOutcome::Closed)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> LinkTermResult<()> {
        let port = self.port_mut()?;
        port.set_timeout(WRITE_TIMEOUT)?;
        let written = port.write_all(data).and_then(|_| port.flush());
        port.set_timeout(Duration::ZERO)?;
        written?;
        debug!("Sent {} bytes over serial", data.len());
        Ok(())
    }

    fn pollable_handle(&self) -> Option<RawFd> {
        self.port.as_ref().map(|port| port.as_raw_fd())
    }

    fn close(&mut self) -> LinkTermResult<()> {
        if self.port.take().is_some() {
            info!(port = %self, "Serial port closed");
        }
        Ok(())
    }
}
