// Infrastructure module - External dependencies and adapters
pub mod config;
pub mod logging;
pub mod serial;
pub mod tcp;

use crate::core::transport::{ReadOutcome, Transport, TransportType};
use crate::domain::{config::ConnectionConfig, error::LinkTermResult};
use serial::SerialClient;
use std::fmt;
use std::os::unix::io::RawFd;
use tcp::TcpClient;

/// The transports a session can drive.
pub enum Endpoint {
    Serial(SerialClient),
    Tcp(TcpClient),
}

impl Endpoint {
    pub fn from_config(config: &ConnectionConfig) -> LinkTermResult<Self> {
        match config {
            ConnectionConfig::Serial { .. } => Ok(Endpoint::Serial(SerialClient::from_config(config)?)),
            ConnectionConfig::Tcp { .. } => Ok(Endpoint::Tcp(TcpClient::from_config(config)?)),
        }
    }

    fn inner(&self) -> &dyn Transport {
        match self {
            Endpoint::Serial(client) => client,
            Endpoint::Tcp(client) => client,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Transport {
        match self {
            Endpoint::Serial(client) => client,
            Endpoint::Tcp(client) => client,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Serial(client) => fmt::Display::fmt(client, f),
            Endpoint::Tcp(client) => fmt::Display::fmt(client, f),
        }
    }
}

impl Transport for Endpoint {
    fn transport_type(&self) -> TransportType {
        self.inner().transport_type()
    }

    fn open(&mut self) -> LinkTermResult<()> {
        self.inner_mut().open()
    }

    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome> {
        self.inner_mut().read(buf)
    }

    fn write(&mut self, data: &[u8]) -> LinkTermResult<()> {
        self.inner_mut().write(data)
    }

    fn pollable_handle(&self) -> Option<RawFd> {
        self.inner().pollable_handle()
    }

    fn close(&mut self) -> LinkTermResult<()> {
        self.inner_mut().close()
    }
}
