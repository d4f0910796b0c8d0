//! Append-only installation transcript.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use uuid::Uuid;

/// Identifies one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form used in log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct InstallLog {
    path: PathBuf,
}

impl InstallLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a message and flush it to disk.
    ///
    /// Each line of a multi-line message gets its own timestamp and run tag,
    /// and the whole record goes out in one write.
    pub fn append(&self, run: RunId, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = format_record(run, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }

    /// Whole transcript, or an empty string before the first run
    pub fn read_all(&self) -> io::Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

fn format_record(run: RunId, message: &str) -> String {
    let prefix = format!(
        "[{}] [run {}]",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        run.short()
    );
    let message = message.trim_end();
    if message.is_empty() {
        return format!("{}\n", prefix);
    }

    let mut record = String::with_capacity(message.len() + prefix.len() + 2);
    for line in message.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            record.push_str(&prefix);
        } else {
            record.push_str(&format!("{} {}", prefix, line));
        }
        record.push('\n');
    }
    record
}

/// A log bound to one run. Every entry is mirrored to tracing.
#[derive(Debug, Clone)]
pub struct RunJournal {
    log: InstallLog,
    run: RunId,
}

impl RunJournal {
    pub fn new(log: InstallLog, run: RunId) -> Self {
        Self { log, run }
    }

    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!(run_id = %self.run, "{}", message);
        self.write(message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!(run_id = %self.run, "{}", message);
        self.write(message);
    }

    fn write(&self, message: &str) {
        if let Err(e) = self.log.append(self.run, message) {
            tracing::warn!(
                run_id = %self.run,
                path = %self.log.path().display(),
                "Failed to write installation log: {}",
                e
            );
        }
    }
}
