use std::fmt;

use crate::cli::{Args, Mode};
use crate::error::{Error, Result};

pub const DEFAULT_REGION: &str = "ams3";
pub const DEFAULT_ENDPOINT: &str = "ams3.digitaloceanspaces.com";
pub const DEFAULT_ACL: &str = "private";
pub const DEFAULT_THREADS: u32 = 20;
pub const DEFAULT_PART_SIZE_MIB: u32 = 5;

pub const MIB: usize = 1024 * 1024;
pub const DEFAULT_PART_SIZE: usize = DEFAULT_PART_SIZE_MIB as usize * MIB;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_id: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Put,
    Multipart { concurrency: usize, part_size: usize },
}

/// Everything needed for a single upload. Built once from the command line
/// and the environment, then handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub target: String,
    pub bucket: String,
    pub key: String,
    pub acl: String,
    pub region: String,
    pub endpoint: String,
    pub credentials: Credentials,
    pub strategy: Strategy,
    pub lenient_exit: bool,
}

impl UploadRequest {
    /// Resolves flags against `env`, falling back to literal defaults.
    ///
    /// An environment variable that is set but empty still counts as set, so
    /// `AWS_DEFAULT_REGION=""` yields an empty region rather than `ams3`.
    pub fn resolve<E>(args: Args, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let pick = |flag: Option<String>, var: &str, default: &str| {
            flag.or_else(|| env(var))
                .unwrap_or_else(|| default.to_owned())
        };

        let region = pick(args.region, "AWS_DEFAULT_REGION", DEFAULT_REGION);
        let endpoint = pick(args.endpoint, "AWS_DEFAULT_ENDPOINT", DEFAULT_ENDPOINT);
        let key_id = pick(args.keyid, "AWS_ACCESS_KEY_ID", "");
        let secret = pick(args.secret, "AWS_SECRET_ACCESS_KEY", "");

        if key_id.is_empty() {
            return Err(Error::MissingCredential {
                flag: "keyid",
                env: "AWS_ACCESS_KEY_ID",
            });
        }
        if secret.is_empty() {
            return Err(Error::MissingCredential {
                flag: "secret",
                env: "AWS_SECRET_ACCESS_KEY",
            });
        }

        let strategy = match args.mode {
            Mode::Put => Strategy::Put,
            Mode::Multipart => Strategy::Multipart {
                concurrency: args.threads as usize,
                part_size: args.part_size as usize * MIB,
            },
        };

        Ok(Self {
            key: args.key.unwrap_or_else(|| args.target.clone()),
            target: args.target,
            bucket: args.bucket,
            acl: args.acl,
            region,
            endpoint,
            credentials: Credentials { key_id, secret },
            strategy,
            lenient_exit: args.lenient_exit,
        })
    }

    pub fn from_env(args: Args) -> Result<Self> {
        Self::resolve(args, |var| std::env::var(var).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["s3-upload", "--target", "./logs/app.log", "--bucket", "backups"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const CREDENTIALS: &[&str] = &["--keyid", "AKID", "--secret", "s3cr3t"];

    #[test]
    fn literal_defaults_apply_without_flags_or_env() {
        let request = UploadRequest::resolve(args(CREDENTIALS), env(&[])).unwrap();
        assert_eq!(request.region, DEFAULT_REGION);
        assert_eq!(request.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(request.acl, DEFAULT_ACL);
        assert_eq!(request.strategy, Strategy::Put);
        assert!(!request.lenient_exit);

        let multipart = UploadRequest::resolve(
            args(&["--keyid", "AKID", "--secret", "s3cr3t", "--mode", "multipart"]),
            env(&[]),
        )
        .unwrap();
        assert_eq!(
            multipart.strategy,
            Strategy::Multipart {
                concurrency: DEFAULT_THREADS as usize,
                part_size: DEFAULT_PART_SIZE,
            }
        );
    }

    #[test]
    fn env_fills_in_missing_flags() {
        let request = UploadRequest::resolve(
            args(&[]),
            env(&[
                ("AWS_DEFAULT_REGION", "fra1"),
                ("AWS_DEFAULT_ENDPOINT", "fra1.digitaloceanspaces.com"),
                ("AWS_ACCESS_KEY_ID", "env-key"),
                ("AWS_SECRET_ACCESS_KEY", "env-secret"),
            ]),
        )
        .unwrap();
        assert_eq!(request.region, "fra1");
        assert_eq!(request.endpoint, "fra1.digitaloceanspaces.com");
        assert_eq!(request.credentials.key_id, "env-key");
        assert_eq!(request.credentials.secret, "env-secret");
    }

    #[test]
    fn flags_win_over_env() {
        let request = UploadRequest::resolve(
            args(&[
                "--region",
                "nyc3",
                "--endpoint",
                "nyc3.digitaloceanspaces.com",
                "--keyid",
                "flag-key",
                "--secret",
                "flag-secret",
            ]),
            env(&[
                ("AWS_DEFAULT_REGION", "fra1"),
                ("AWS_DEFAULT_ENDPOINT", "fra1.digitaloceanspaces.com"),
                ("AWS_ACCESS_KEY_ID", "env-key"),
                ("AWS_SECRET_ACCESS_KEY", "env-secret"),
            ]),
        )
        .unwrap();
        assert_eq!(request.region, "nyc3");
        assert_eq!(request.endpoint, "nyc3.digitaloceanspaces.com");
        assert_eq!(request.credentials.key_id, "flag-key");
        assert_eq!(request.credentials.secret, "flag-secret");
    }

    #[test]
    fn key_is_the_literal_target() {
        let request = UploadRequest::resolve(args(CREDENTIALS), env(&[])).unwrap();
        assert_eq!(request.target, "./logs/app.log");
        assert_eq!(request.key, "./logs/app.log");

        let renamed = UploadRequest::resolve(
            args(&["--keyid", "AKID", "--secret", "s3cr3t", "--key", "app.log"]),
            env(&[]),
        )
        .unwrap();
        assert_eq!(renamed.key, "app.log");
        assert_eq!(renamed.target, "./logs/app.log");
    }

    #[test]
    fn missing_key_id_is_rejected_first() {
        let err = UploadRequest::resolve(args(&[]), env(&[])).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCredential { flag: "keyid", .. }
        ));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = UploadRequest::resolve(args(&["--keyid", "AKID"]), env(&[])).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCredential { flag: "secret", .. }
        ));
    }

    #[test]
    fn empty_env_credential_counts_as_missing() {
        let err = UploadRequest::resolve(
            args(&[]),
            env(&[("AWS_ACCESS_KEY_ID", "env-key"), ("AWS_SECRET_ACCESS_KEY", "")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCredential { flag: "secret", .. }
        ));
    }

    #[test]
    fn debug_output_hides_secret() {
        let request = UploadRequest::resolve(args(CREDENTIALS), env(&[])).unwrap();
        let printed = format!("{:?}", request);
        assert!(printed.contains("AKID"));
        assert!(!printed.contains("s3cr3t"));
    }
}
