use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::{
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use log::{debug, warn};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt},
    sync::OnceCell,
    task::spawn_blocking,
};

use crate::error::{Error, Result};

use super::ObjectUploader;

/// Files at least this large are sent as multipart uploads.
const MULTIPART_THRESHOLD: u64 = 8 * 1024 * 1024;

const MIN_PART_SIZE: u64 = 8 * 1024 * 1024;
const MAX_PARTS: u64 = 10_000;

/// How a file of a given size is sent. Only one part is held in memory at a
/// time, so memory per upload is bounded by the part size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadPlan {
    Single,
    Multipart { part_size: u64, part_count: u64 },
}

impl UploadPlan {
    fn for_size(size: u64) -> Self {
        if size < MULTIPART_THRESHOLD {
            return UploadPlan::Single;
        }

        let part_size = MIN_PART_SIZE.max(size.div_ceil(MAX_PARTS));
        UploadPlan::Multipart {
            part_size,
            part_count: size.div_ceil(part_size),
        }
    }
}

/// Uploads to S3 with credentials and region taken from the environment. The
/// client is created on first use.
#[derive(Debug, Default)]
pub struct S3Uploader {
    client: OnceCell<Client>,
}

impl S3Uploader {
    pub fn new() -> Self {
        S3Uploader {
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                let s3_config = aws_config::load_from_env().await;
                Client::new(&s3_config)
            })
            .await
    }

    async fn put_single(&self, bucket: &str, key: &str, file: &mut File, size: u64) -> Result<u64> {
        let (bytes, encoded_digest) = digest(read_part(file, size).await?).await?;
        let sent = bytes.len() as u64;

        self.client()
            .await
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(bytes.into())
            .content_md5(encoded_digest)
            .send()
            .await?;

        Ok(sent)
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        file: &mut File,
        part_size: u64,
    ) -> Result<u64> {
        let client = self.client().await;
        let multipart_upload_res = client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| Error::Sdk(format!("no upload id returned for `{key}`")))?;

        let result = send_parts(client, bucket, key, upload_id, file, part_size).await;
        if result.is_err() {
            let abort_result = client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .send()
                .await;
            if let Err(err) = abort_result {
                warn!("Failed to abort upload of {key}: {}", Error::from(err));
            }
        }

        result
    }
}

#[async_trait]
impl ObjectUploader for S3Uploader {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let mut file = File::open(path).await?;
        let size = file.metadata().await?.len();

        match UploadPlan::for_size(size) {
            UploadPlan::Single => self.put_single(bucket, key, &mut file, size).await,
            UploadPlan::Multipart {
                part_size,
                part_count,
            } => {
                debug!("sending {key} in {part_count} parts");
                self.put_multipart(bucket, key, &mut file, part_size).await
            }
        }
    }
}

async fn send_parts(
    client: &Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    file: &mut File,
    part_size: u64,
) -> Result<u64> {
    let mut parts = Vec::new();
    let mut sent = 0;
    let mut part_number = 0;

    loop {
        let chunk = read_part(file, part_size).await?;
        if chunk.is_empty() {
            break;
        }

        part_number += 1;
        sent += chunk.len() as u64;
        let (chunk, encoded_digest) = digest(chunk).await?;
        let upload_part_res = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(chunk.into())
            .content_md5(encoded_digest)
            .send()
            .await?;

        let part = CompletedPart::builder()
            .e_tag(upload_part_res.e_tag.unwrap_or_default())
            .part_number(part_number)
            .build();
        parts.push(part);
    }

    let completed_multipart_upload = CompletedMultipartUpload::builder()
        .set_parts(Some(parts))
        .build();

    client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(key)
        .multipart_upload(completed_multipart_upload)
        .upload_id(upload_id)
        .send()
        .await?;

    Ok(sent)
}

/// Reads the next `part_size` bytes, or fewer at end of file.
async fn read_part<R: AsyncRead + Unpin>(reader: &mut R, part_size: u64) -> Result<Vec<u8>> {
    let capacity = usize::try_from(part_size).map_err(Error::other)?;
    let mut part = Vec::with_capacity(capacity);
    reader.take(part_size).read_to_end(&mut part).await?;
    Ok(part)
}

async fn digest(bytes: Vec<u8>) -> Result<(Vec<u8>, String)> {
    let digested = spawn_blocking(move || {
        let encoded_digest = md5_base64(&bytes);
        (bytes, encoded_digest)
    })
    .await?;
    Ok(digested)
}

fn md5_base64(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    BASE64_STANDARD.encode(digest.0)
}
