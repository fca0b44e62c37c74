use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::run::{CorrelationId, RunResult};

/// One completed run, as written to the audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunAuditRecord {
    pub record_id: String,
    pub correlation_id: CorrelationId,
    pub user_request: String,
    pub recorded_at: DateTime<Utc>,
    pub result: RunResult,
}

impl RunAuditRecord {
    pub fn new(user_request: impl Into<String>, result: RunResult) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            correlation_id: result.correlation_id.clone(),
            user_request: user_request.into(),
            recorded_at: Utc::now(),
            result,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("could not write audit log `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not encode audit record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write-only destination for completed runs.
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: &RunAuditRecord) -> Result<(), AuditError>;
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<Mutex<Vec<RunAuditRecord>>>,
}

impl InMemoryAuditSink {
    pub fn records(&self) -> Vec<RunAuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, record: &RunAuditRecord) -> Result<(), AuditError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }
}

/// Appends one JSON line per record. The file is never read back.
pub struct JsonlAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn emit(&self, record: &RunAuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let write_error = |source| AuditError::Write { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).map_err(write_error)?;
        file.write_all(line.as_bytes()).map_err(write_error)
    }
}
