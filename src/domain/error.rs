use thiserror::Error;

/// LinkTerm unified error type
#[derive(Error, Debug)]
pub enum LinkTermError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to connect to {target}: {message}")]
    Connection { target: String, message: String },

    #[error("Device not connected")]
    NotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Line editor error: {0}")]
    Editor(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl LinkTermError {
    /// Build a connection error for `target` from any displayable cause.
    pub fn connection(target: impl ToString, cause: impl std::fmt::Display) -> Self {
        Self::Connection {
            target: target.to_string(),
            message: cause.to_string(),
        }
    }
}

pub type LinkTermResult<T> = Result<T, LinkTermError>;

/// Process exit statuses. The numeric values are stable for scripting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Clean end of session: EOF or operator interrupt.
    Success = 0,
    /// Unexpected fault propagated to the process boundary.
    Fault = 1,
    /// Bad arguments or unreadable configuration.
    Usage = 2,
    /// The first connection was not established within `timeout_first`.
    InitialConnectTimeout = 3,
    /// A dropped link was not re-established within `timeout_later`.
    LaterConnectTimeout = 4,
    /// The operator interrupted the first connection attempt.
    InitialConnectInterrupted = 5,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let all = [
            ExitStatus::Success,
            ExitStatus::Fault,
            ExitStatus::Usage,
            ExitStatus::InitialConnectTimeout,
            ExitStatus::LaterConnectTimeout,
            ExitStatus::InitialConnectInterrupted,
        ];
        let mut codes: Vec<u8> = all.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
        assert_eq!(ExitStatus::Usage.code(), 2);
    }

    #[test]
    fn test_connection_error_display() {
        let err = LinkTermError::connection("localhost:4000", "Connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to connect to localhost:4000: Connection refused"
        );
    }
}
