use crate::core::{
    framer::LineFramer,
    interrupt::Interrupt,
    output::OutputSink,
    reconnect::{ConnectError, ConnectPhase, ConnectReport, ReconnectPolicy, Reconnector, RETRY_INTERVAL},
    session::{
        command::{CommandWriter, Pacing},
        editor::{EditStep, LineEditor},
        transfer::FileTransfer,
    },
    transport::{ReadOutcome, Transport},
};
use crate::domain::config::{ConnectTimeout, Eol};
use crate::domain::error::{LinkTermError, LinkTermResult};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info, warn};

/// Upper bound for a single transport read.
pub const READ_CHUNK: usize = 1024;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prompt shown by the line editor
    pub prompt: String,
    /// Sequence appended to every command
    pub eol: Eol,
    /// Delimiter framing inbound lines
    pub rx_delimiter: Eol,
    /// Outbound pacing
    pub pacing: Pacing,
    /// Connect budgets
    pub policy: ReconnectPolicy,
    /// Pause between connect attempts
    pub retry_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            eol: Eol::Crlf,
            rx_delimiter: Eol::Lf,
            pacing: Pacing::default(),
            policy: ReconnectPolicy::new(
                ConnectTimeout::After(Duration::from_secs(1)),
                ConnectTimeout::Forever,
            ),
            retry_interval: RETRY_INTERVAL,
        }
    }
}

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The line editor reported end of input.
    Eof,
    /// The operator interrupted the session.
    Interrupted,
    /// The link dropped and could not be re-established in time.
    LaterConnectTimeout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub lines_received: u64,
    pub commands_sent: u64,
    pub reconnects: u64,
}

/// Raw descriptor registered with the reactor. The transport keeps ownership.
struct Pollable(RawFd);

impl AsRawFd for Pollable {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

enum LoopEvent {
    Interrupted,
    Input,
    Transport(ReadOutcome),
}

struct TransferHook {
    prefix: String,
    sender: Box<dyn FileTransfer>,
}

/// Single-threaded event loop joining the local line editor to a transport.
pub struct Session<E: LineEditor, T: Transport> {
    config: SessionConfig,
    editor: E,
    transport: T,
    reconnector: Reconnector,
    framer: LineFramer,
    writer: CommandWriter,
    sink: OutputSink,
    interrupt: Interrupt,
    readiness: Option<AsyncFd<Pollable>>,
    transfer: Option<TransferHook>,
    stats: SessionStats,
}

impl<E: LineEditor, T: Transport> Session<E, T> {
    pub fn new(editor: E, transport: T, sink: OutputSink, config: SessionConfig) -> Self {
        let reconnector =
            Reconnector::new(config.policy).with_retry_interval(config.retry_interval);
        let framer = LineFramer::new(config.rx_delimiter.as_bytes());
        let writer = CommandWriter::new(config.eol, config.pacing);

        Self {
            config,
            editor,
            transport,
            reconnector,
            framer,
            writer,
            sink,
            interrupt: Interrupt::never(),
            readiness: None,
            transfer: None,
            stats: SessionStats::default(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Lines starting with `prefix` hand the rest of the line, as a path, to
    /// `sender` instead of being written to the transport.
    pub fn with_file_transfer(
        mut self,
        prefix: impl Into<String>,
        sender: Box<dyn FileTransfer>,
    ) -> Self {
        self.transfer = Some(TransferHook {
            prefix: prefix.into(),
            sender,
        });
        self
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_editor(self) -> E {
        self.editor
    }

    /// Establish the first connection under the `timeout_first` budget.
    pub async fn connect(&mut self) -> Result<ConnectReport, ConnectError> {
        self.reconnector
            .connect(&mut self.transport, ConnectPhase::Initial, &mut self.interrupt)
            .await
    }

    /// Run until end of input, operator interrupt, or reconnect failure.
    ///
    /// The line editor is stopped on every exit path, including errors, before
    /// this returns.
    pub async fn run(&mut self) -> LinkTermResult<SessionEnd> {
        let result = self.run_loop().await;
        let stopped = self.editor.stop_edit();
        self.readiness = None;

        match result {
            Ok(end) => {
                stopped?;
                info!(
                    transport = %self.transport,
                    ?end,
                    lines = self.stats.lines_received,
                    commands = self.stats.commands_sent,
                    reconnects = self.stats.reconnects,
                    "Session ended"
                );
                Ok(end)
            }
            Err(err) => {
                if let Err(stop_err) = stopped {
                    warn!(error = %stop_err, "Failed to restore the terminal");
                }
                Err(err)
            }
        }
    }

    async fn run_loop(&mut self) -> LinkTermResult<SessionEnd> {
        self.register()?;
        self.editor.start_edit(&self.config.prompt)?;
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let readiness = self.readiness.as_ref().ok_or(LinkTermError::NotConnected)?;

            let event = tokio::select! {
                biased;
                _ = self.interrupt.triggered() => LoopEvent::Interrupted,
                ready = self.editor.input_ready() => {
                    ready?;
                    LoopEvent::Input
                }
                guard = readiness.readable() => {
                    let mut guard = guard?;
                    let outcome = self.transport.read(&mut buf).unwrap_or_else(|err| {
                        warn!(transport = %self.transport, error = %err, "Read failed");
                        ReadOutcome::Closed
                    });
                    if outcome == ReadOutcome::Idle {
                        guard.clear_ready();
                    }
                    LoopEvent::Transport(outcome)
                }
            };

            match event {
                LoopEvent::Interrupted => return Ok(SessionEnd::Interrupted),
                LoopEvent::Input => {
                    if let Some(end) = self.on_input().await? {
                        return Ok(end);
                    }
                }
                LoopEvent::Transport(ReadOutcome::Data(n)) => {
                    self.stats.bytes_received += n as u64;
                    self.framer.feed(&buf[..n]);
                    self.drain_lines()?;
                }
                LoopEvent::Transport(ReadOutcome::Idle) => {}
                LoopEvent::Transport(ReadOutcome::Closed) => {
                    if let Some(end) = self.on_link_closed().await? {
                        return Ok(end);
                    }
                }
            }
        }
    }

    async fn on_input(&mut self) -> LinkTermResult<Option<SessionEnd>> {
        match self.editor.feed_edit_step()? {
            EditStep::More => {}
            EditStep::EofOrError => return Ok(Some(SessionEnd::Eof)),
            EditStep::CancelLine => {
                self.editor.stop_edit()?;
                self.editor.start_edit(&self.config.prompt)?;
            }
            EditStep::LineComplete(line) => {
                self.editor.stop_edit()?;
                self.editor.history_add(&line);
                if let Err(err) = self.dispatch(&line).await {
                    warn!(transport = %self.transport, error = %err, "Write failed");
                    return self.on_link_closed().await;
                }
                self.editor.start_edit(&self.config.prompt)?;
            }
        }
        Ok(None)
    }

    async fn dispatch(&mut self, line: &str) -> LinkTermResult<()> {
        let transfer_path = self
            .transfer
            .as_ref()
            .and_then(|hook| line.strip_prefix(hook.prefix.as_str()))
            .map(|path| path.trim().to_string());

        match transfer_path {
            Some(path) if !path.is_empty() => self.run_transfer(Path::new(&path)),
            _ => {
                self.writer.dispatch(&mut self.transport, line).await?;
                self.stats.commands_sent += 1;
                Ok(())
            }
        }
    }

    /// Give the transport to the file sender. Inbound reads stop for the
    /// duration and resume once the sender returns. A failed transfer is
    /// reported and the session carries on; a dead link shows up on the next
    /// read.
    fn run_transfer(&mut self, path: &Path) -> LinkTermResult<()> {
        let Some(hook) = self.transfer.as_mut() else {
            return Ok(());
        };
        self.readiness = None;
        info!(transport = %self.transport, path = %path.display(), "Starting file transfer");
        match hook.sender.send_file(&mut self.transport, path) {
            Ok(()) => info!(path = %path.display(), "File transfer finished"),
            Err(err) => warn!(path = %path.display(), error = %err, "File transfer failed"),
        }
        self.register()
    }

    /// Emit every complete buffered line with the edit line hidden once.
    fn drain_lines(&mut self) -> LinkTermResult<()> {
        if !self.framer.has_complete_line() {
            return Ok(());
        }
        self.editor.hide()?;
        while let Some(line) = self.framer.extract_line() {
            self.sink.emit(&line)?;
            self.stats.lines_received += 1;
        }
        self.editor.show()
    }

    /// Drop the dead link and reconnect under the `timeout_later` budget.
    /// Editing resumes on a fresh prompt.
    async fn on_link_closed(&mut self) -> LinkTermResult<Option<SessionEnd>> {
        self.editor.hide()?;
        warn!(transport = %self.transport, "Connection closed, will retry");
        self.sink.note(&format!("{} closed", self.transport))?;

        self.readiness = None;
        self.transport.close()?;
        if !self.framer.pending().is_empty() {
            debug!(bytes = self.framer.pending().len(), "Discarding unterminated input");
            self.framer.clear();
        }

        match self
            .reconnector
            .connect(&mut self.transport, ConnectPhase::Later, &mut self.interrupt)
            .await
        {
            Ok(_) => {
                self.stats.reconnects += 1;
                self.register()?;
                self.sink.note(&format!("{} reconnected", self.transport))?;
                self.editor.stop_edit()?;
                self.editor.start_edit(&self.config.prompt)?;
                Ok(None)
            }
            Err(ConnectError::TimedOut { .. }) => Ok(Some(SessionEnd::LaterConnectTimeout)),
            Err(ConnectError::Cancelled { .. }) => Ok(Some(SessionEnd::Interrupted)),
        }
    }

    fn register(&mut self) -> LinkTermResult<()> {
        self.readiness = None;
        let fd = self
            .transport
            .pollable_handle()
            .ok_or(LinkTermError::NotConnected)?;
        self.readiness = Some(AsyncFd::with_interest(Pollable(fd), Interest::READABLE)?);
        Ok(())
    }
}
