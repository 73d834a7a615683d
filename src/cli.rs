use std::ffi::OsString;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{DEFAULT_ACL, DEFAULT_PART_SIZE_MIB, DEFAULT_THREADS};

/// Long flags that may also be spelled with a single leading dash.
const LONG_FLAGS: &[&str] = &[
    "target",
    "bucket",
    "key",
    "acl",
    "region",
    "endpoint",
    "keyid",
    "secret",
    "mode",
    "threads",
    "part-size",
    "debug",
    "lenient-exit",
];

/// This is a simple S3-compatible upload CLI tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of file to upload.
    #[arg(long, allow_hyphen_values = true)]
    pub target: String,

    /// Name of bucket to upload to.
    #[arg(long, allow_hyphen_values = true)]
    pub bucket: String,

    /// Object key. Defaults to the target path as given.
    #[arg(long, allow_hyphen_values = true)]
    pub key: Option<String>,

    /// Type of permission for file.
    #[arg(long, default_value = DEFAULT_ACL, allow_hyphen_values = true)]
    pub acl: String,

    /// Name of region to upload to [env: AWS_DEFAULT_REGION] [default: ams3]
    #[arg(long, allow_hyphen_values = true)]
    pub region: Option<String>,

    /// S3 API endpoint [env: AWS_DEFAULT_ENDPOINT] [default: ams3.digitaloceanspaces.com]
    #[arg(long, allow_hyphen_values = true)]
    pub endpoint: Option<String>,

    /// API key ID [env: AWS_ACCESS_KEY_ID]
    #[arg(long, allow_hyphen_values = true)]
    pub keyid: Option<String>,

    /// API secret key [env: AWS_SECRET_ACCESS_KEY]
    #[arg(long, allow_hyphen_values = true)]
    pub secret: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Put)]
    pub mode: Mode,

    /// Concurrent part uploads in multipart mode.
    #[arg(long, default_value_t = DEFAULT_THREADS, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: u32,

    /// Part size in MiB in multipart mode.
    #[arg(
        long,
        default_value_t = DEFAULT_PART_SIZE_MIB,
        value_parser = clap::value_parser!(u32).range(DEFAULT_PART_SIZE_MIB as i64..)
    )]
    pub part_size: u32,

    /// Enable debug logging. Accepts `--debug=false`.
    #[arg(
        long,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub debug: bool,

    /// Print upload failures to stdout and exit with status 0.
    #[arg(
        long,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub lenient_exit: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Single PutObject request.
    Put,
    /// Concurrent multi-part upload.
    Multipart,
}

/// Rewrites `-target` style flags into `--target` so clap accepts them.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if terminated {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                terminated = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
