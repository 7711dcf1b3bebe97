//! Append-only CSV record of every answered message.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::core::models::{ConversationId, LogRecord, Modality};
use crate::errors::PipelineError;

pub const AUDIT_HEADER: [&str; 5] = ["chat_id", "datetime", "message", "message_type", "ai_response"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct AuditLogger {
    path: PathBuf,
    // Serializes writers so rows never interleave.
    write_lock: Mutex<()>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with its header row. A file that already exists is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn initialize(&self) -> Result<(), PipelineError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(AUDIT_HEADER)?;
        writer.flush()?;
        info!("Created audit log at {}", self.path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn append(&self, record: &LogRecord) -> Result<(), PipelineError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Append a row stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn record(
        &self,
        chat: ConversationId,
        message: &str,
        modality: Modality,
        response: &str,
    ) -> Result<(), PipelineError> {
        self.append(&LogRecord {
            chat_id: chat.0,
            datetime: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            message: message.to_string(),
            message_type: modality.as_str().to_string(),
            ai_response: response.to_string(),
        })
    }
}
