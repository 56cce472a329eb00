// History module - bounded command history, one entry per line on disk

use crate::domain::error::{LinkTermError, LinkTermResult};
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Load entries from `path`, keeping the most recent `limit`. A missing
    /// file yields an empty history.
    pub fn load(path: &Path, limit: usize) -> LinkTermResult<Self> {
        let mut history = Self::new(limit);
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(history),
            Err(e) => {
                return Err(LinkTermError::Config {
                    message: format!("Failed to read history file {}: {}", path.display(), e),
                })
            }
        };
        for line in content.lines() {
            history.push(line);
        }
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> LinkTermResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(path, content).map_err(|e| LinkTermError::Config {
            message: format!("Failed to write history file {}: {}", path.display(), e),
        })
    }

    /// Append an entry. Blank lines and repeats of the last entry are skipped.
    pub fn push(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || self.limit == 0 {
            return;
        }
        if self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        self.entries.push_back(line.to_string());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Entry `index` steps back from the newest (0 is the newest).
    pub fn recent(&self, index: usize) -> Option<&str> {
        self.entries
            .len()
            .checked_sub(index + 1)
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
