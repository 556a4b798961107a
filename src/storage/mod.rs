mod local;
mod s3;

use std::{fmt::Debug, path::Path};

use async_trait::async_trait;

use crate::error::Result;

pub use {local::LocalUploader, s3::S3Uploader};

/// Writes whole files into a key-addressed object store.
#[async_trait]
pub trait ObjectUploader: Debug + Send + Sync {
    /// Uploads the file at `path` to `bucket` under `key`, overwriting any
    /// existing object, and returns the number of bytes written.
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<u64>;
}
