//! Session log of the command line tool.
//!
//! Each run of a subcommand becomes one [`LogEntry`] listing the files it
//! decoded, the decode warnings they raised and the files it wrote, together
//! with the command line that repeats it.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position in the session
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    /// Subcommand name
    pub operation: String,
    pub command: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl LogEntry {
    /// Block of lines: a header followed by one tagged line per file or
    /// warning.
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!(
            "#{} {} {}",
            self.sequence,
            self.timestamp.format("%H:%M:%S"),
            self.operation
        )];
        if !self.command.is_empty() {
            lines.push(format!("  $ {}", self.command));
        }
        let tagged = [
            ("read ", &self.inputs),
            ("warn ", &self.warnings),
            ("wrote", &self.outputs),
        ];
        for (tag, items) in tagged {
            lines.extend(items.iter().map(|item| format!("  {} {}", tag, item)));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub software_version: String,
    pub entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    /// Open a new entry; the `add_*` methods attach to it.
    pub fn record(&mut self, operation: &str, command: &str) -> usize {
        let seq = self.entries.len() + 1;
        self.entries.push(LogEntry {
            sequence: seq,
            timestamp: Local::now(),
            operation: operation.to_string(),
            command: command.to_string(),
            inputs: Vec::new(),
            warnings: Vec::new(),
            outputs: Vec::new(),
        });
        log::debug!("Session entry {} ({})", seq, operation);
        seq
    }

    pub fn add_input(&mut self, path: &Path) {
        if let Some(entry) = self.entries.last_mut() {
            entry.inputs.push(path.display().to_string());
        }
    }

    pub fn add_warning(&mut self, warning: impl ToString) {
        if let Some(entry) = self.entries.last_mut() {
            entry.warnings.push(warning.to_string());
        }
    }

    pub fn add_output(&mut self, path: &Path) {
        if let Some(entry) = self.entries.last_mut() {
            entry.outputs.push(path.display().to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of warnings across all entries.
    pub fn warning_count(&self) -> usize {
        self.entries.iter().map(|e| e.warnings.len()).sum()
    }

    pub fn to_text(&self) -> String {
        let mut out = format!(
            "thales-tools {} session {}\nstarted {}, {} operation(s), {} warning(s)\n",
            self.software_version,
            self.session_id,
            self.session_start.format("%Y-%m-%d %H:%M:%S"),
            self.entries.len(),
            self.warning_count()
        );
        for entry in &self.entries {
            out.push('\n');
            out.push_str(&entry.to_text());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write as JSON when `path` ends in `.json`, as text otherwise.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let content = if is_json {
            self.to_json()?
        } else {
            self.to_text()
        };
        std::fs::write(path, content)
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
