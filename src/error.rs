use rusoto_core::request::TlsError;
use rusoto_core::RusotoError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("provide --{flag} flag or {env} env var")]
    MissingCredential {
        flag: &'static str,
        env: &'static str,
    },
    #[error("failed to open file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] TlsError),
    #[error("{0}")]
    Upload(BoxError),
}

impl Error {
    pub fn upload(err: impl Into<BoxError>) -> Self {
        Self::Upload(err.into())
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_) | Self::Client(_))
    }

    /// Process exit status for this error. A lenient run swallows upload
    /// failures and exits cleanly after printing them.
    pub fn exit_status(&self, lenient: bool) -> u8 {
        if lenient && self.is_upload() {
            0
        } else {
            1
        }
    }
}

impl<E> From<RusotoError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: RusotoError<E>) -> Self {
        Self::Upload(Box::new(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
