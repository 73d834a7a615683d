use std::io;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{future, stream, StreamExt, TryStreamExt};
use rusoto_core::ByteStream;
use rusoto_s3::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, CompletedMultipartUpload,
    CompletedPart, CreateMultipartUploadRequest, S3Client, UploadPartRequest, S3,
};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::put::put_object;
use super::{Receipt, Uploader};
use crate::client::object_location;
use crate::config::{UploadRequest, DEFAULT_PART_SIZE};
use crate::error::{Error, Result};

const MAX_PARTS: u64 = 10_000;

#[derive(Debug)]
struct UploadPart {
    part_number: i64,
    body: Bytes,
}

/// Splits a file into parts and uploads up to `concurrency` of them at a time.
/// Files no larger than one part go out as a plain PutObject.
pub struct MultipartUploader {
    client: S3Client,
    concurrency: usize,
    part_size: usize,
}

impl MultipartUploader {
    pub fn new(client: S3Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
            part_size: DEFAULT_PART_SIZE,
        }
    }

    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size.max(1);
        self
    }

    /// Grows the part size when the file would otherwise need more parts
    /// than S3 accepts.
    fn effective_part_size(&self, size: u64) -> usize {
        let min_for_size = (size + MAX_PARTS - 1) / MAX_PARTS;
        self.part_size.max(min_for_size as usize)
    }

    async fn create(&self, request: &UploadRequest) -> Result<String> {
        let create_multipart_request = CreateMultipartUploadRequest {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            acl: Some(request.acl.clone()),
            ..Default::default()
        };
        let output = self
            .client
            .create_multipart_upload(create_multipart_request)
            .await?;
        output
            .upload_id
            .ok_or_else(|| Error::upload("create multipart upload returned no upload id"))
    }

    async fn upload_parts(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        file: File,
        part_size: usize,
    ) -> Result<Vec<CompletedPart>> {
        let (tx, rx) = mpsc::channel(self.concurrency);

        tokio::spawn(async move {
            let mut file = file;
            let mut part_number = 1;
            loop {
                let part = match read_part(&mut file, part_size).await {
                    Ok(body) if body.is_empty() => break,
                    Ok(body) => Ok(UploadPart { part_number, body }),
                    Err(err) => Err(err),
                };
                let failed = part.is_err();
                if tx.send(part).await.is_err() || failed {
                    break;
                }
                part_number += 1;
            }
        });

        let mut parts: Vec<CompletedPart> = tokio_stream::wrappers::ReceiverStream::new(rx)
            .map(|part| async move {
                let part = part.map_err(Error::upload)?;
                self.upload_part(request, upload_id, part).await
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        parts.sort_by_key(|part| part.part_number);
        Ok(parts)
    }

    async fn upload_part(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        part: UploadPart,
    ) -> Result<CompletedPart> {
        let size = part.body.len();
        let upload_part_request = UploadPartRequest {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            part_number: part.part_number,
            upload_id: upload_id.to_owned(),
            content_length: Some(size as i64),
            body: Some(part_body(part.body)),
            ..Default::default()
        };

        let output = self.client.upload_part(upload_part_request).await?;
        debug!(part = part.part_number, bytes = size, "uploaded part");

        let e_tag = output.e_tag.ok_or_else(|| {
            Error::upload(format!("part {} returned no ETag", part.part_number))
        })?;
        Ok(CompletedPart {
            e_tag: Some(e_tag),
            part_number: Some(part.part_number),
        })
    }

    async fn complete(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<Receipt> {
        let complete_multipart_request = CompleteMultipartUploadRequest {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            upload_id: upload_id.to_owned(),
            multipart_upload: Some(CompletedMultipartUpload { parts: Some(parts) }),
            ..Default::default()
        };

        let output = self
            .client
            .complete_multipart_upload(complete_multipart_request)
            .await?;

        Ok(Receipt {
            e_tag: output.e_tag,
            location: output.location.unwrap_or_else(|| {
                object_location(&request.endpoint, &request.bucket, &request.key)
            }),
        })
    }

    async fn abort(&self, request: &UploadRequest, upload_id: &str) {
        let abort_request = AbortMultipartUploadRequest {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            upload_id: upload_id.to_owned(),
            ..Default::default()
        };
        if let Err(err) = self.client.abort_multipart_upload(abort_request).await {
            warn!(upload_id, "failed to abort multipart upload: {}", err);
        }
    }
}

#[async_trait]
impl Uploader for MultipartUploader {
    async fn upload(&self, request: &UploadRequest, file: File) -> Result<Receipt> {
        let size = file.metadata().await.map_err(Error::upload)?.len();
        if size <= self.part_size as u64 {
            debug!(size, "file fits in one part, using PutObject");
            return put_object(&self.client, request, file).await;
        }

        let part_size = self.effective_part_size(size);
        let upload_id = self.create(request).await?;
        debug!(
            upload_id = %upload_id,
            size,
            part_size,
            concurrency = self.concurrency,
            "started multipart upload"
        );

        match self.upload_parts(request, &upload_id, file, part_size).await {
            Ok(parts) => self.complete(request, &upload_id, parts).await,
            Err(err) => {
                self.abort(request, &upload_id).await;
                Err(err)
            }
        }
    }
}

/// Reads up to `part_size` bytes. Returns an empty buffer at end of file.
async fn read_part(file: &mut File, part_size: usize) -> io::Result<Bytes> {
    let mut buffer = BytesMut::with_capacity(part_size);
    let mut reader = file.take(part_size as u64);
    while reader.read_buf(&mut buffer).await? != 0 {}
    Ok(buffer.freeze())
}

fn part_body(body: Bytes) -> ByteStream {
    let size = body.len();
    ByteStream::new_with_size(stream::once(future::ready(Ok::<_, io::Error>(body))), size)
}
