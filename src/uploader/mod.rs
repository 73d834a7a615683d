mod multipart;
mod put;

use async_trait::async_trait;
use tokio::fs::File;

use crate::client::s3_client;
use crate::config::{Strategy, UploadRequest};
use crate::error::Result;

pub use multipart::MultipartUploader;
pub use put::PutUploader;

/// What the storage service reported back for a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub e_tag: Option<String>,
    pub location: String,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, request: &UploadRequest, file: File) -> Result<Receipt>;
}

/// Builds the uploader selected by the request's strategy.
pub fn for_request(request: &UploadRequest) -> Result<Box<dyn Uploader>> {
    let client = s3_client(request)?;
    Ok(match request.strategy {
        Strategy::Put => Box::new(PutUploader::new(client)),
        Strategy::Multipart {
            concurrency,
            part_size,
        } => Box::new(MultipartUploader::new(client, concurrency).with_part_size(part_size)),
    })
}
