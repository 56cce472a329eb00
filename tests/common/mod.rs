//! Shared fakes for session-level tests.
#![allow(dead_code)]

use async_trait::async_trait;
use linkterm::core::session::{EditStep, FileTransfer, LineEditor};
use linkterm::core::transport::{ReadOutcome, Transport, TransportType};
use linkterm::domain::error::{LinkTermError, LinkTermResult};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Calls the session made on a [`ScriptedEditor`], in order.
#[derive(Debug, Default)]
pub struct EditorLog {
    pub calls: Vec<String>,
    pub history: Vec<String>,
}

impl EditorLog {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }
}

/// Line editor fed from a channel. Dropping every sender reads as end of input.
pub struct ScriptedEditor {
    steps: mpsc::UnboundedReceiver<EditStep>,
    next: Option<EditStep>,
    log: Rc<RefCell<EditorLog>>,
}

impl ScriptedEditor {
    pub fn new() -> (Self, mpsc::UnboundedSender<EditStep>, Rc<RefCell<EditorLog>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let log = Rc::new(RefCell::new(EditorLog::default()));
        let editor = Self {
            steps: rx,
            next: None,
            log: Rc::clone(&log),
        };
        (editor, tx, log)
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().calls.push(call.to_string());
    }
}

#[async_trait(?Send)]
impl LineEditor for ScriptedEditor {
    async fn input_ready(&mut self) -> LinkTermResult<()> {
        if self.next.is_none() {
            let step = self.steps.recv().await.unwrap_or(EditStep::EofOrError);
            self.next = Some(step);
        }
        Ok(())
    }

    fn feed_edit_step(&mut self) -> LinkTermResult<EditStep> {
        Ok(self.next.take().unwrap_or(EditStep::More))
    }

    fn start_edit(&mut self, _prompt: &str) -> LinkTermResult<()> {
        self.record("start");
        Ok(())
    }

    fn stop_edit(&mut self) -> LinkTermResult<()> {
        self.record("stop");
        Ok(())
    }

    fn hide(&mut self) -> LinkTermResult<()> {
        self.record("hide");
        Ok(())
    }

    fn show(&mut self) -> LinkTermResult<()> {
        self.record("show");
        Ok(())
    }

    fn history_add(&mut self, line: &str) {
        let mut log = self.log.borrow_mut();
        log.calls.push(format!("history:{}", line));
        log.history.push(line.to_string());
    }
}

/// Knobs and counters shared between a test and its [`PipeTransport`].
#[derive(Debug, Default)]
pub struct PipeControl {
    pub opens: Cell<u32>,
    pub failures_left: Cell<u32>,
    pub written: RefCell<Vec<u8>>,
}

/// Transport over a Unix socket pair. Every successful open hands the far end
/// to the test through a channel.
pub struct PipeTransport {
    local: Option<UnixStream>,
    remotes: mpsc::UnboundedSender<UnixStream>,
    control: Rc<PipeControl>,
}

impl PipeTransport {
    pub fn new() -> (
        Self,
        mpsc::UnboundedReceiver<UnixStream>,
        Rc<PipeControl>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Rc::new(PipeControl::default());
        let transport = Self {
            local: None,
            remotes: tx,
            control: Rc::clone(&control),
        };
        (transport, rx, control)
    }
}

impl fmt::Display for PipeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe")
    }
}

impl Transport for PipeTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Serial
    }

    fn open(&mut self) -> LinkTermResult<()> {
        self.control.opens.set(self.control.opens.get() + 1);
        let failures = self.control.failures_left.get();
        if failures > 0 {
            self.control.failures_left.set(failures - 1);
            return Err(LinkTermError::connection(&*self, "scripted failure"));
        }
        let (local, remote) = UnixStream::pair()?;
        local.set_nonblocking(true)?;
        remote.set_nonblocking(true)?;
        self.local = Some(local);
        let _ = self.remotes.send(remote);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> LinkTermResult<ReadOutcome> {
        let local = self.local.as_mut().ok_or(LinkTermError::NotConnected)?;
        match local.read(buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(ReadOutcome::Idle),
            Err(e) if e.kind() == ErrorKind::ConnectionReset => Ok(ReadOutcome::Closed),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> LinkTermResult<()> {
        let local = self.local.as_mut().ok_or(LinkTermError::NotConnected)?;
        local.write_all(data)?;
        self.control.written.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    fn pollable_handle(&self) -> Option<RawFd> {
        self.local.as_ref().map(|s| s.as_raw_fd())
    }

    fn close(&mut self) -> LinkTermResult<()> {
        self.local = None;
        Ok(())
    }
}

/// Console stand-in that tests can read back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console whose every write fails, for driving the session's fault path.
#[derive(Debug, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::Other, "console gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(ErrorKind::Other, "console gone"))
    }
}

/// File sender that writes a marker carrying the path instead of a real
/// protocol exchange.
#[derive(Debug, Default)]
pub struct MarkerSender {
    pub sent: Rc<RefCell<Vec<PathBuf>>>,
}

impl FileTransfer for MarkerSender {
    fn send_file(&mut self, transport: &mut dyn Transport, path: &Path) -> LinkTermResult<()> {
        transport.write(format!("FILE:{}", path.display()).as_bytes())?;
        self.sent.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Strip the timestamp from a console line.
pub fn body(line: &str) -> &str {
    line.split_once(' ').map(|(_, rest)| rest).unwrap_or(line)
}
