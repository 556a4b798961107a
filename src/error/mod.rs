mod from;

use std::{fmt::Display, path::PathBuf, time::Duration};

use humantime::{format_duration, FormattedDuration};
use thiserror::Error;

use crate::job::StrategyKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no backup strategy selected (expected `remote` or `s3`)")]
    MissingStrategy,

    #[error("backup strategy `{0}` is not recognized (expected `remote` or `s3`)")]
    UnknownStrategy(String),

    #[error("no source directory given")]
    MissingSourceDir,

    #[error("`{option}` is required for the `{strategy}` strategy")]
    MissingOption {
        strategy: StrategyKind,
        option: &'static str,
    },

    #[error("environment variable `{0}` is not valid unicode")]
    InvalidEnvVar(&'static str),

    #[error("job file `{}` is invalid: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error("mirror to `{destination}` failed ({status}): {diagnostic}")]
    MirrorFailed {
        destination: String,
        status: String,
        diagnostic: String,
    },

    #[error("failed to launch `{program}`: {source}")]
    MirrorLaunch {
        program: String,
        source: std::io::Error,
    },

    #[error("mirror to `{destination}` timed out after {}", format_timeout(.timeout))]
    MirrorTimedOut {
        destination: String,
        timeout: Duration,
    },

    #[error("upload timed out after {}", format_timeout(.0))]
    UploadTimedOut(Duration),

    #[error("key for `{}` is not valid UTF-8", .0.display())]
    InvalidKey(PathBuf),

    #[error("{0}")]
    Sdk(String),

    #[error("{source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("{source}")]
    Walk {
        #[from]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Other(AnyError),
}

impl Error {
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(AnyError(error.into()))
    }

    /// Errors that mean no transfer was attempted at all.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingStrategy
                | Error::UnknownStrategy(_)
                | Error::MissingSourceDir
                | Error::MissingOption { .. }
                | Error::InvalidEnvVar(_)
                | Error::InvalidConfig { .. }
        )
    }
}

fn format_timeout(timeout: &Duration) -> FormattedDuration {
    format_duration(*timeout)
}

#[derive(Error, Debug)]
pub struct AnyError(anyhow::Error);

impl Display for AnyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Other(AnyError(error))
    }
}
