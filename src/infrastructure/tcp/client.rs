use crate::core::transport::{ReadOutcome, Transport, TransportType};
use crate::domain::{
    config::ConnectionConfig,
    error::{LinkTermError, LinkTermResult},
};
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::{debug, info, warn};

/// TCP client transport. The stream is non-blocking between writes.
pub struct TcpClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpClient {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            stream: None,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> LinkTermResult<Self> {
        match config {
            ConnectionConfig::Tcp {
                host,
                port,
                timeout_ms,
            } => Ok(Self::new(host.clone(), *port, Duration::from_millis(*timeout_ms))),
            _ => Err(LinkTermError::InvalidInput(
                "Invalid connection type for TCP client".to_string(),
            )),
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|stream| stream.peer_addr().ok())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|stream| stream.local_addr().ok())
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }

    fn stream_mut(&mut self) -> LinkTermResult<&mut TcpStream> {
        self.stream.as_mut().ok_or(LinkTermError::NotConnected)
    }
}

impl fmt::Display for TcpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Transport for TcpClient {
    fn transport_type(&self) -> TransportType {
        TransportType::Tcp
    }

    fn open(&mut self) -> LinkTermResult<()> {
        self.close()?;
        let stream = self
            .connect()
            .map_err(|e| LinkTermError::connection(&*self, e))?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }
        stream
            .set_nonblocking(true)
            .map_err(|e| LinkTermError::connection(&*self, e))?;

        debug!(peer = ?stream.peer_addr().ok(), "TCP connection established");
        self.stream = Some(stream);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome> {
        let stream = self.stream_mut()?;
        match stream.read(buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::TimedOut => {
                    Ok(ReadOutcome::Idle)
                }
                ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof => {
                    debug!(error = %e, "TCP stream dropped");
                    Ok(ReadOutcome::Closed)
                }
                _ => Err(e.into()),
            },
        }
    }

    fn write(&mut self, data: &[u8]) -> LinkTermResult<()> {
        let stream = self.stream_mut()?;
        stream.set_nonblocking(false)?;
        let written = stream.write_all(data).and_then(|_| stream.flush());
        stream.set_nonblocking(true)?;
        written?;
        debug!("Sent {} bytes over TCP", data.len());
        Ok(())
    }

    fn pollable_handle(&self) -> Option<RawFd> {
        self.stream.as_ref().map(|stream| stream.as_raw_fd())
    }

    fn close(&mut self) -> LinkTermResult<()> {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                if e.kind() != ErrorKind::NotConnected {
                    warn!("Failed to shutdown TCP stream: {}", e);
                }
            }
            info!(peer = %self, "TCP client closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn create_test_config(port: u16) -> ConnectionConfig {
        ConnectionConfig::Tcp {
            host: "127.0.0.1".to_string(),
            port,
            timeout_ms: 1000,
        }
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_tcp_client_open_fails_gracefully() {
        let mut client = TcpClient::from_config(&create_test_config(closed_port())).unwrap();

        let result = client.open();
        assert!(matches!(result, Err(LinkTermError::Connection { .. })));
        assert_eq!(client.pollable_handle(), None);
    }

    #[test]
    fn test_read_write_and_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = TcpClient::from_config(&create_test_config(port)).unwrap();

        client.open().unwrap();
        assert!(client.is_open());
        let (mut peer, _) = listener.accept().unwrap();

        let mut buf = [0u8; 64];
        assert_eq!(client.read(&mut buf).unwrap(), ReadOutcome::Idle);

        client.write(b"ping\r\n").unwrap();
        let mut received = [0u8; 6];
        peer.read_exact(&mut received).unwrap();
        assert_eq!(&received, b"ping\r\n");

        peer.write_all(b"pong\n").unwrap();
        drop(peer);

        let mut data = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            match client.read(&mut buf).unwrap() {
                ReadOutcome::Data(n) => data.extend_from_slice(&buf[..n]),
                ReadOutcome::Idle => std::thread::sleep(Duration::from_millis(5)),
                ReadOutcome::Closed => break,
            }
            assert!(std::time::Instant::now() < deadline, "peer close not observed");
        }
        assert_eq!(data, b"pong\n");

        client.close().unwrap();
        client.close().unwrap();
        assert!(!client.is_open());
    }

    #[test]
    fn test_reopen_after_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = TcpClient::new("127.0.0.1", port, Duration::from_secs(1));

        client.open().unwrap();
        client.close().unwrap();
        client.open().unwrap();
        assert!(client.peer_addr().is_some());
    }

    #[test]
    fn test_identity() {
        let client = TcpClient::new("localhost", 4000, Duration::from_secs(1));
        assert_eq!(client.to_string(), "localhost:4000");
        assert_eq!(client.transport_type(), TransportType::Tcp);
    }
}
