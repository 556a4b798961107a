use std::path::{Path, PathBuf};

use serde::Serialize;

/// A single file found under the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferUnit {
    pub local_path: PathBuf,
    pub relative_path: PathBuf,
}

impl TransferUnit {
    pub fn new<P: AsRef<Path>>(source_dir: &Path, local_path: P) -> Self {
        let local_path = local_path.as_ref().to_owned();
        let relative_path = match local_path.strip_prefix(source_dir) {
            Ok(path) if path.as_os_str().is_empty() => PathBuf::from("."),
            Ok(path) => path.to_owned(),
            Err(_) => local_path.clone(),
        };

        TransferUnit {
            local_path,
            relative_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitOutcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitResult {
    pub unit: TransferUnit,
    pub outcome: UnitOutcome,
}

impl UnitResult {
    pub fn success(unit: TransferUnit) -> Self {
        UnitResult {
            unit,
            outcome: UnitOutcome::Success,
        }
    }

    pub fn failure<M: ToString>(unit: TransferUnit, message: M) -> Self {
        UnitResult {
            unit,
            outcome: UnitOutcome::Failure(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == UnitOutcome::Success
    }

    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            UnitOutcome::Success => None,
            UnitOutcome::Failure(message) => Some(message),
        }
    }
}
