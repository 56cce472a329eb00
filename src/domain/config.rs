use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// LinkTerm configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkTermConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Connection defaults
    #[serde(default)]
    pub connect: ConnectConfig,
    /// Outbound pacing
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Received-line log file; `None` picks the data directory default
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Command history file; `None` picks the data directory default
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History limit
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Prompt shown by the line editor
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

/// Connection defaults shared by serial and TCP targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Budget for the first connection
    #[serde(default = "default_timeout_first")]
    pub timeout_first: ConnectTimeout,
    /// Budget for reconnecting after the link dropped
    #[serde(default = "default_timeout_later")]
    pub timeout_later: ConnectTimeout,
    /// Per-attempt TCP connect timeout in milliseconds
    #[serde(default = "default_tcp_timeout")]
    pub tcp_connect_timeout_ms: u64,
    /// Sequence appended to every command
    #[serde(default = "default_eol")]
    pub eol: Eol,
    /// Delimiter splitting the inbound stream into lines
    #[serde(default = "default_rx_delimiter")]
    pub rx_delimiter: Eol,
}

/// Outbound pacing, all in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default)]
    pub byte_delay_ms: u64,
    #[serde(default)]
    pub eol_delay_ms: u64,
    #[serde(default)]
    pub post_delay_ms: u64,
}

impl PacingConfig {
    pub fn byte_delay(&self) -> Duration {
        Duration::from_millis(self.byte_delay_ms)
    }

    pub fn eol_delay(&self) -> Duration {
        Duration::from_millis(self.eol_delay_ms)
    }

    pub fn post_delay(&self) -> Duration {
        Duration::from_millis(self.post_delay_ms)
    }
}

/// Connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectionConfig {
    #[serde(rename = "serial")]
    Serial { port: String, baud_rate: u32 },
    #[serde(rename = "tcp")]
    Tcp {
        host: String,
        port: u16,
        #[serde(default = "default_tcp_timeout")]
        timeout_ms: u64,
    },
}

/// End-of-line sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eol {
    Lf,
    Cr,
    Crlf,
}

impl Eol {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Eol::Lf => b"\n",
            Eol::Cr => b"\r",
            Eol::Crlf => b"\r\n",
        }
    }
}

impl fmt::Display for Eol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eol::Lf => write!(f, "lf"),
            Eol::Cr => write!(f, "cr"),
            Eol::Crlf => write!(f, "crlf"),
        }
    }
}

/// How long a connect sequence may keep retrying.
///
/// The textual form accepts `forever`, `infinite` or `inf`, or a number of
/// seconds. A value of `0` is read as [`ConnectTimeout::Forever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeoutSetting", into = "TimeoutSetting")]
pub enum ConnectTimeout {
    Forever,
    After(Duration),
}

impl ConnectTimeout {
    /// `0` means [`ConnectTimeout::Forever`]. Negative, NaN and values too large
    /// for a `Duration` are rejected.
    pub fn seconds(secs: f64) -> Result<Self, String> {
        if secs == 0.0 {
            return Ok(ConnectTimeout::Forever);
        }
        Duration::try_from_secs_f64(secs)
            .map(ConnectTimeout::After)
            .map_err(|e| format!("invalid timeout {}: {}", secs, e))
    }

    /// Whether `elapsed` has used up the budget.
    pub fn is_exceeded(&self, elapsed: Duration) -> bool {
        match self {
            ConnectTimeout::Forever => false,
            ConnectTimeout::After(limit) => elapsed >= *limit,
        }
    }
}

impl fmt::Display for ConnectTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectTimeout::Forever => write!(f, "forever"),
            ConnectTimeout::After(limit) => write!(f, "{}s", limit.as_secs_f64()),
        }
    }
}

impl FromStr for ConnectTimeout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "forever" | "infinite" | "inf" => return Ok(ConnectTimeout::Forever),
            _ => {}
        }
        let secs: f64 = value
            .parse()
            .map_err(|_| format!("invalid timeout '{}': expected seconds or 'forever'", s))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("invalid timeout '{}': must be a non-negative number", s));
        }
        ConnectTimeout::seconds(secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TimeoutSetting {
    Seconds(f64),
    Text(String),
}

impl TryFrom<TimeoutSetting> for ConnectTimeout {
    type Error = String;

    fn try_from(setting: TimeoutSetting) -> Result<Self, Self::Error> {
        match setting {
            TimeoutSetting::Seconds(secs) => secs.to_string().parse(),
            TimeoutSetting::Text(text) => text.parse(),
        }
    }
}

impl From<ConnectTimeout> for TimeoutSetting {
    fn from(timeout: ConnectTimeout) -> Self {
        match timeout {
            ConnectTimeout::Forever => TimeoutSetting::Text("forever".to_string()),
            ConnectTimeout::After(limit) => TimeoutSetting::Seconds(limit.as_secs_f64()),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    1000
}

fn default_prompt() -> String {
    "> ".to_string()
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_timeout_first() -> ConnectTimeout {
    ConnectTimeout::After(Duration::from_secs(1))
}

fn default_timeout_later() -> ConnectTimeout {
    ConnectTimeout::Forever
}

fn default_tcp_timeout() -> u64 {
    3000
}

fn default_eol() -> Eol {
    Eol::Crlf
}

fn default_rx_delimiter() -> Eol {
    Eol::Lf
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            history_file: None,
            history_limit: default_history_limit(),
            prompt: default_prompt(),
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            timeout_first: default_timeout_first(),
            timeout_later: default_timeout_later(),
            tcp_connect_timeout_ms: default_tcp_timeout(),
            eol: default_eol(),
            rx_delimiter: default_rx_delimiter(),
        }
    }
}
