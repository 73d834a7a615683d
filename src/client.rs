use rusoto_core::{HttpClient, Region};
use rusoto_credential::StaticProvider;
use rusoto_s3::S3Client;

use crate::config::UploadRequest;
use crate::error::Result;

pub fn region(request: &UploadRequest) -> Region {
    Region::Custom {
        name: request.region.clone(),
        endpoint: request.endpoint.clone(),
    }
}

pub fn s3_client(request: &UploadRequest) -> Result<S3Client> {
    let credentials_provider = StaticProvider::new_minimal(
        request.credentials.key_id.clone(),
        request.credentials.secret.clone(),
    );

    Ok(S3Client::new_with(
        HttpClient::new()?,
        credentials_provider,
        region(request),
    ))
}

/// Path-style URL of an object, matching how requests are addressed.
pub fn object_location(endpoint: &str, bucket: &str, key: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_owned()
    } else {
        format!("https://{}", endpoint)
    };
    format!("{}/{}/{}", base, bucket, key)
}
