
use std::{
    env::{self, VarError},
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};

const ENV_VAR_STRATEGY: &str = "OFFSITE_STRATEGY";
const ENV_VAR_SOURCE_DIR: &str = "OFFSITE_SOURCE_DIR";
const ENV_VAR_REMOTE_USER: &str = "OFFSITE_REMOTE_USER";
const ENV_VAR_REMOTE_HOST: &str = "OFFSITE_REMOTE_HOST";
const ENV_VAR_REMOTE_DIR: &str = "OFFSITE_REMOTE_DIR";
const ENV_VAR_REMOTE_SHELL: &str = "OFFSITE_REMOTE_SHELL";
const ENV_VAR_BUCKET: &str = "OFFSITE_BUCKET";
const ENV_VAR_LOCAL_STORE: &str = "OFFSITE_LOCAL_STORE";

/// Unvalidated job options, as read from a job file, the environment or the
/// command line. `BackupJob::from_config` turns this into a typed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobConfig {
    pub strategy: Option<String>,
    pub source_dir: Option<PathBuf>,
    pub remote_user: Option<String>,
    pub remote_host: Option<String>,
    pub remote_dir: Option<String>,
    pub remote_shell: Option<String>,
    pub bucket_name: Option<String>,
    pub local_store: Option<PathBuf>,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |message: String| Error::InvalidConfig {
            path: path.to_owned(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|err| invalid(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| invalid(err.to_string()))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let var = |key: &'static str| match lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(Error::InvalidEnvVar(key)),
        };

        Ok(JobConfig {
            strategy: var(ENV_VAR_STRATEGY)?,
            source_dir: var(ENV_VAR_SOURCE_DIR)?.map(PathBuf::from),
            remote_user: var(ENV_VAR_REMOTE_USER)?,
            remote_host: var(ENV_VAR_REMOTE_HOST)?,
            remote_dir: var(ENV_VAR_REMOTE_DIR)?,
            remote_shell: var(ENV_VAR_REMOTE_SHELL)?,
            bucket_name: var(ENV_VAR_BUCKET)?,
            local_store: var(ENV_VAR_LOCAL_STORE)?.map(PathBuf::from),
        })
    }

    /// Options set in `other` take precedence over the ones in `self`.
    #[must_use]
    pub fn overlay(self, other: JobConfig) -> Self {
        JobConfig {
            strategy: other.strategy.or(self.strategy),
            source_dir: other.source_dir.or(self.source_dir),
            remote_user: other.remote_user.or(self.remote_user),
            remote_host: other.remote_host.or(self.remote_host),
            remote_dir: other.remote_dir.or(self.remote_dir),
            remote_shell: other.remote_shell.or(self.remote_shell),
            bucket_name: other.bucket_name.or(self.bucket_name),
            local_store: other.local_store.or(self.local_store),
        }
    }
}
