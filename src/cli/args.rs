use crate::domain::config::{ConnectTimeout, Eol};
use clap::{ArgGroup, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Command line arguments for LinkTerm
#[derive(Parser, Debug)]
#[command(
    name = "linkterm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive line terminal for serial ports and TCP sockets",
    long_about = "Reads commands from the console and sends them to a serial device or TCP endpoint, \
printing every received line with a timestamp. The link is re-established automatically when it drops."
)]
#[command(group(ArgGroup::new("target").required(true).args(["serial", "socket"])))]
pub struct Args {
    /// Serial device to open, e.g. /dev/ttyUSB0
    #[arg(long, value_name = "DEVICE")]
    pub serial: Option<String>,

    /// TCP endpoint to connect to; an empty host means localhost
    #[arg(long, value_name = "HOST:PORT", value_parser = parse_host_port)]
    pub socket: Option<SocketTarget>,

    /// Serial baud rate
    #[arg(long, value_name = "N")]
    pub baudrate: Option<u32>,

    /// Seconds to keep trying the first connection (0 or "forever" for no limit)
    #[arg(long, value_name = "SECONDS")]
    pub timeout_first: Option<ConnectTimeout>,

    /// Seconds to keep trying after the link dropped (0 or "forever" for no limit)
    #[arg(long, value_name = "SECONDS")]
    pub timeout_later: Option<ConnectTimeout>,

    /// Line ending appended to every command
    #[arg(long, value_enum)]
    pub eol: Option<EolArg>,

    /// Delimiter splitting received data into lines
    #[arg(long, value_enum)]
    pub rx_delimiter: Option<EolArg>,

    /// Delay between transmitted bytes in milliseconds
    #[arg(long, value_name = "MS")]
    pub byte_delay: Option<u64>,

    /// Delay before the line ending in milliseconds
    #[arg(long, value_name = "MS")]
    pub eol_delay: Option<u64>,

    /// Delay after each command in milliseconds
    #[arg(long, value_name = "MS")]
    pub post_delay: Option<u64>,

    /// Append received lines to this file
    #[arg(long, value_name = "PATH", conflicts_with = "no_log")]
    pub log_file: Option<PathBuf>,

    /// Do not write the received-line log
    #[arg(long)]
    pub no_log: bool,

    /// Command history file
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Maximum number of history entries kept
    #[arg(long, value_name = "N")]
    pub history_size: Option<usize>,

    /// Prompt shown in front of the edit line
    #[arg(long)]
    pub prompt: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress diagnostics
    #[arg(short, long)]
    pub quiet: bool,
}

/// Line ending choices on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolArg {
    Lf,
    Cr,
    Crlf,
}

impl From<EolArg> for Eol {
    fn from(arg: EolArg) -> Self {
        match arg {
            EolArg::Lf => Eol::Lf,
            EolArg::Cr => Eol::Cr,
            EolArg::Crlf => Eol::Crlf,
        }
    }
}

/// Parsed `HOST:PORT` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for SocketTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Split `HOST:PORT` on the last colon. An empty host means `localhost`.
pub fn parse_host_port(value: &str) -> Result<SocketTarget, String> {
    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HOST:PORT, got '{}'", value))?;
    let port: u16 = port
        .parse()
        .map_err(|_| format!("invalid port '{}'", port))?;
    if port == 0 {
        return Err("port must be non-zero".to_string());
    }
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { "localhost" } else { host };
    Ok(SocketTarget {
        host: host.to_string(),
        port,
    })
}
