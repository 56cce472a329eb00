use crate::domain::error::LinkTermResult;
use std::fmt;
use std::os::unix::io::RawFd;

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    Serial,
    Tcp,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Serial => write!(f, "serial"),
            TransportType::Tcp => write!(f, "tcp"),
        }
    }
}

/// Result of a single non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the front of the buffer.
    Data(usize),
    /// Nothing available right now; the link is still up.
    Idle,
    /// The peer closed the stream or the driver reported the link as gone.
    Closed,
}

/// Byte-stream endpoint driven by the session loop.
///
/// Implementations start unopened. `open` acquires the OS resource and leaves it
/// in non-blocking mode, `close` releases it and is a no-op when already closed,
/// and the transport can be opened again afterwards. The `Display` form is the
/// identity used in log messages.
pub trait Transport: fmt::Display {
    fn transport_type(&self) -> TransportType;

    /// Establish the connection. Failures are `LinkTermError::Connection`.
    fn open(&mut self) -> LinkTermResult<()>;

    /// Read up to `buf.len()` bytes without blocking.
    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome>;

    /// Write the whole buffer, blocking until it is handed to the OS.
    fn write(&mut self, data: &[u8]) -> LinkTermResult<()>;

    /// Descriptor to register for read readiness, `None` while closed.
    fn pollable_handle(&self) -> Option<RawFd>;

    fn close(&mut self) -> LinkTermResult<()>;

    fn is_open(&self) -> bool {
        self.pollable_handle().is_some()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transport_type(&self) -> TransportType {
        (**self).transport_type()
    }

    fn open(&mut self) -> LinkTermResult<()> {
        (**self).open()
    }

    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome> {
        (**self).read(buf)
    }

    fn write(&mut self, data: &[u8]) -> LinkTermResult<()> {
        (**self).write(data)
    }

    fn pollable_handle(&self) -> Option<RawFd> {
        (**self).pollable_handle()
    }

    fn close(&mut self) -> LinkTermResult<()> {
        (**self).close()
    }
}
