use tokio::fs::File;
use tracing::{debug, info};

use crate::config::{Strategy, UploadRequest};
use crate::error::{Error, Result};
use crate::uploader::{Receipt, Uploader};

/// Opens the target and runs exactly one upload. The request is consumed, so
/// a second attempt needs a freshly resolved request.
pub async fn upload(request: UploadRequest, uploader: &dyn Uploader) -> Result<Receipt> {
    let file = File::open(&request.target)
        .await
        .map_err(|source| Error::Open {
            path: request.target.clone(),
            source,
        })?;

    // A plain put stays quiet unless debugging.
    if request.strategy == Strategy::Put {
        debug!(path = %request.target, bucket = %request.bucket, key = %request.key, "uploading");
    } else {
        info!(
            path = %request.target,
            bucket = %request.bucket,
            key = %request.key,
            acl = %request.acl,
            "uploading"
        );
    }
    debug!(strategy = ?request.strategy, endpoint = %request.endpoint, region = %request.region);

    uploader.upload(&request, file).await
}
