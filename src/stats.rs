use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub files_uploaded: u64,
    pub files_failed: u64,
    /// Files that a dry run would have uploaded.
    pub files_skipped: u64,
    pub bytes_uploaded: u64,
}

impl CommandStats {
    pub fn new() -> Self {
        CommandStats {
            start_time: Utc::now(),
            end_time: None,
            files_uploaded: 0,
            files_failed: 0,
            files_skipped: 0,
            bytes_uploaded: 0,
        }
    }

    pub fn add_upload(&mut self, size: u64) {
        self.files_uploaded += 1;
        self.bytes_uploaded += size;
    }

    pub fn add_failure(&mut self) {
        self.files_failed += 1;
    }

    pub fn add_skipped(&mut self) {
        self.files_skipped += 1;
    }

    pub fn files_total(&self) -> u64 {
        self.files_uploaded + self.files_failed + self.files_skipped
    }

    pub fn end(&mut self) -> DateTime<Utc> {
        let end_time = Utc::now();
        self.end_time = Some(end_time);
        end_time
    }

    pub fn elapsed_time(&self) -> Duration {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        (end_time - self.start_time).to_std().unwrap_or_default()
    }
}

impl Default for CommandStats {
    fn default() -> Self {
        Self::new()
    }
}
