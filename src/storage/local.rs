use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, time::sleep};

use crate::{error::Result, keys::KEY_SEPARATOR};

use super::ObjectUploader;

/// Stores objects as plain files under `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    root: PathBuf,
    latency: Option<Duration>,
}

impl LocalUploader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        LocalUploader {
            root: root.as_ref().to_owned(),
            latency: None,
        }
    }

    /// Delays every upload, to mimic a remote store.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        key.split(KEY_SEPARATOR)
            .fold(self.root.join(bucket), |path, part| path.join(part))
    }
}

#[async_trait]
impl ObjectUploader for LocalUploader {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }

        let object_path = self.object_path(bucket, key);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = fs::copy(path, &object_path).await?;
        Ok(size)
    }
}
