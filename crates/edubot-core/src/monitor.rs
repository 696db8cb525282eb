//! Interaction monitoring.
//!
//! Keeps the most recent interaction records in memory and optionally appends
//! each one as a JSON line to `<log_dir>/chat_logs.jsonl` for later research
//! analysis.
#![allow(clippy::arithmetic_side_effects, reason = "ring buffer bookkeeping")]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use edubot_types::InteractionRecord;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AppResult;

pub const INTERACTION_LOG_FILE: &str = "chat_logs.jsonl";
const DEFAULT_MAX_RECORDS: usize = 1000;

pub struct InteractionMonitor {
    records: RwLock<VecDeque<InteractionRecord>>,
    max_records: usize,
    sink: Option<PathBuf>,
}

impl InteractionMonitor {
    /// In-memory only.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(DEFAULT_MAX_RECORDS)),
            max_records: DEFAULT_MAX_RECORDS,
            sink: None,
        }
    }

    /// Also appends to `chat_logs.jsonl` under `log_dir`.
    pub fn with_log_dir(log_dir: impl AsRef<Path>) -> Self {
        Self { sink: Some(log_dir.as_ref().join(INTERACTION_LOG_FILE)), ..Self::new() }
    }

    pub fn sink_path(&self) -> Option<&Path> {
        self.sink.as_deref()
    }

    /// Stores the record. Sink failures are logged and swallowed.
    pub async fn log_interaction(&self, record: InteractionRecord) {
        if let Some(path) = &self.sink {
            if let Err(e) = append_line(path, &record).await {
                warn!("Failed to write interaction log {}: {}", path.display(), e);
            }
        }

        debug!(
            emotion = %record.emotion,
            model = %record.llm_model,
            total_ms = record.total_time_ms,
            fallback = record.fallback,
            "Interaction recorded"
        );

        let mut records = self.records.write().await;
        if records.len() >= self.max_records {
            let excess = records.len() - self.max_records + 1;
            records.drain(..excess);
        }
        records.push_back(record);
    }

    /// Newest first.
    pub async fn recent(&self, limit: Option<usize>) -> Vec<InteractionRecord> {
        let records = self.records.read().await;
        let limit = limit.unwrap_or(records.len());
        records.iter().rev().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

impl Default for InteractionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

async fn append_line(path: &Path, record: &InteractionRecord) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file =
        tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
