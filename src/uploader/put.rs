use async_trait::async_trait;
use rusoto_s3::{PutObjectRequest, S3Client, S3};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::{Receipt, Uploader};
use crate::client::object_location;
use crate::config::UploadRequest;
use crate::error::{Error, Result};

pub struct PutUploader {
    client: S3Client,
}

impl PutUploader {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Uploader for PutUploader {
    async fn upload(&self, request: &UploadRequest, file: File) -> Result<Receipt> {
        put_object(&self.client, request, file).await
    }
}

/// Sends the whole file as the body of one PutObject request.
pub(super) async fn put_object(
    client: &S3Client,
    request: &UploadRequest,
    mut file: File,
) -> Result<Receipt> {
    let mut body = Vec::new();
    file.read_to_end(&mut body).await.map_err(Error::upload)?;
    debug!(bytes = body.len(), "putting object");

    let put_request = PutObjectRequest {
        bucket: request.bucket.clone(),
        key: request.key.clone(),
        acl: Some(request.acl.clone()),
        body: Some(body.into()),
        ..Default::default()
    };

    let output = client.put_object(put_request).await?;

    Ok(Receipt {
        e_tag: output.e_tag,
        location: object_location(&request.endpoint, &request.bucket, &request.key),
    })
}
