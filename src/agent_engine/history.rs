use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::agent_engine::decision::Decision;
use crate::agent_engine::state::StepOutcome;
use crate::errors::GridZoomResult;
use crate::perception::types::Region;

/// One iteration as written to the session JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: i64,
    pub iteration: u32,
    pub region: Region,
    pub reasoning: String,
    pub action: String,
    pub value: serde_json::Value,
    pub outcome: StepOutcome,
}

impl HistoryEntry {
    pub fn new(iteration: u32, region: Region, decision: &Decision, outcome: StepOutcome) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp_millis(),
            iteration,
            region,
            reasoning: decision.reasoning.clone(),
            action: decision.action.to_string(),
            value: decision.value.clone(),
            outcome,
        }
    }
}

/// Append-only JSONL log for one session. Entries go straight to disk.
pub struct SessionHistory {
    pub session_id: String,
    file_path: PathBuf,
    written: u32,
}

impl SessionHistory {
    /// History file under `dir`, or the per-user data directory when `dir` is `None`.
    pub fn new(dir: Option<&Path>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let dir = match dir {
            Some(d) => {
                let _ = std::fs::create_dir_all(d);
                d.to_path_buf()
            }
            None => data_dir_or_cwd(),
        };
        let file_path = dir.join(format!("session_{session_id}.jsonl"));
        Self {
            session_id,
            file_path,
            written: 0,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Number of entries written so far.
    pub fn written(&self) -> u32 {
        self.written
    }

    /// Append `entry` as one line of the JSONL file.
    pub fn append(&mut self, entry: &HistoryEntry) -> GridZoomResult<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        self.written += 1;
        tracing::debug!(
            path = %self.file_path.display(),
            iteration = entry.iteration,
            "history entry written"
        );
        Ok(())
    }
}

/// `<data_local_dir>/gridzoom/sessions`, falling back to the current working directory.
fn data_dir_or_cwd() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let d = data_dir.join("gridzoom").join("sessions");
        if std::fs::create_dir_all(&d).is_ok() {
            return d;
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
