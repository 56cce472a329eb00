// Output module - console and log renderings of inbound lines

use crate::domain::error::{LinkTermError, LinkTermResult};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// 7-bit C1 Fe escape, including complete CSI sequences.
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("ANSI escape pattern is valid")
});

const COLOR_RESET: &str = "\x1b[0m";
const ESC: char = '\x1b';

/// Timestamp format: ISO-8601 local time with millisecond resolution.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Both renderings of one inbound line, sharing a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub timestamp: String,
    pub console: String,
    pub log: String,
}

/// Decode bytes as UTF-8 (lossily) and drop one trailing carriage return.
pub fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(text) => Cow::Borrowed(text.strip_suffix('\r').unwrap_or(text)),
        Cow::Owned(mut text) => {
            if text.ends_with('\r') {
                text.pop();
            }
            Cow::Owned(text)
        }
    }
}

/// Console form: ANSI sequences kept verbatim, other control characters
/// escaped as `\xHH`. A colour reset is appended when the line held an ESC.
pub fn render_console(raw: &[u8]) -> String {
    let text = decode_line(raw);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for escape in ANSI_ESCAPE.find_iter(&text) {
        escape_console(&mut out, &text[last..escape.start()]);
        out.push_str(escape.as_str());
        last = escape.end();
    }
    escape_console(&mut out, &text[last..]);
    if text.contains(ESC) {
        out.push_str(COLOR_RESET);
    }
    out
}

/// Log form: ANSI sequences stripped, `\n` and `\r` written as literal
/// tokens, every other control character escaped as `\xHH`.
pub fn render_log(raw: &[u8]) -> String {
    let text = decode_line(raw);
    let stripped = ANSI_ESCAPE.replace_all(&text, "");
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => push_hex(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

fn escape_console(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\n' | '\r' => out.push(c),
            c if c.is_control() => push_hex(out, c),
            c => out.push(c),
        }
    }
}

fn push_hex(out: &mut String, c: char) {
    // Control characters all sit below U+0100.
    let _ = write!(out, "\\x{:02x}", c as u32);
}

/// Routes each inbound line to the console and, when configured, to an
/// append-only log.
pub struct OutputSink {
    console: Box<dyn Write>,
    log: Option<Box<dyn Write>>,
}

impl OutputSink {
    pub fn new(console: Box<dyn Write>) -> Self {
        Self { console, log: None }
    }

    pub fn with_log(mut self, log: Box<dyn Write>) -> Self {
        self.log = Some(log);
        self
    }

    /// Open `path` for appending, creating it and its parent directories.
    pub fn with_log_file(self, path: &Path) -> LinkTermResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LinkTermError::Output(format!(
                    "Failed to create log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LinkTermError::Output(format!("Failed to open log file {}: {}", path.display(), e))
            })?;
        Ok(self.with_log(Box::new(file)))
    }

    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    pub fn emit(&mut self, raw: &[u8]) -> LinkTermResult<RenderedLine> {
        let rendered = RenderedLine {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            console: render_console(raw),
            log: render_log(raw),
        };

        writeln!(self.console, "{} {}", rendered.timestamp, rendered.console)?;
        self.console.flush()?;

        if let Some(log) = self.log.as_mut() {
            writeln!(log, "{} {}", rendered.timestamp, rendered.log)?;
            log.flush()?;
        }

        Ok(rendered)
    }

    /// Append a free-form note to the log only, escaped like a received line.
    pub fn note(&mut self, message: &str) -> LinkTermResult<()> {
        if let Some(log) = self.log.as_mut() {
            let timestamp = Local::now().format(TIMESTAMP_FORMAT);
            writeln!(log, "{} # {}", timestamp, render_log(message.as_bytes()))?;
            log.flush()?;
        }
        Ok(())
    }
}
